//! Binary/JSON codec for the Semtech UDP packet-forwarder protocol 2.0.0.
#![allow(clippy::upper_case_acronyms)]
use num_enum::TryFromPrimitive;
use std::fmt;
use std::io::{Cursor, Write};

mod error;
pub use error::{Error, ParseError};
pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod types;
pub use types::*;

pub mod parser;
pub use parser::Parser;

pub mod pull_ack;
pub mod pull_data;
pub mod pull_resp;
pub mod push_ack;
pub mod push_data;
pub mod tx_ack;

pub use pull_resp::TxPk;
pub use push_data::{RxPk, Stat, CRC};

const PROTOCOL_VERSION: u8 = 2;

/// 64-bit gateway EUI, carried big-endian in every uplink frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GatewayId([u8; 8]);

impl GatewayId {
    pub const ZERO: GatewayId = GatewayId([0; 8]);

    pub fn from_hex(s: &str) -> Option<GatewayId> {
        parse_gateway_id_hex(s).map(GatewayId)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl From<[u8; 8]> for GatewayId {
    fn from(bytes: [u8; 8]) -> Self {
        GatewayId(bytes)
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// The wire `ident` byte, discriminating the six Semtech frame types.
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum Identifier {
    PushData = 0,
    PushAck = 1,
    PullData = 2,
    PullResp = 3,
    PullAck = 4,
    TxAck = 5,
}

/// A framed Semtech UDP message, tagged by direction so callers never need
/// to inspect `ident` themselves to know which payload variant is present.
#[derive(Debug, Clone)]
pub enum Packet {
    Up(Up),
    Down(Down),
}

#[derive(Debug, Clone)]
pub enum Up {
    PushData(push_data::Packet),
    PullData(pull_data::Packet),
    TxAck(tx_ack::Packet),
}

impl Up {
    pub fn random_token(&self) -> u16 {
        match self {
            Up::PushData(pkt) => pkt.random_token,
            Up::PullData(pkt) => pkt.random_token,
            Up::TxAck(pkt) => pkt.random_token,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Down {
    PushAck(push_ack::Packet),
    PullAck(pull_ack::Packet),
    PullResp(Box<pull_resp::Packet>),
}

pub trait SerializablePacket {
    fn serialize(&self, buffer: &mut [u8]) -> Result<u64>;
}

impl SerializablePacket for Packet {
    fn serialize(&self, buffer: &mut [u8]) -> Result<u64> {
        match self {
            Packet::Up(up) => match up {
                Up::PushData(pkt) => pkt.serialize(buffer),
                Up::PullData(pkt) => pkt.serialize(buffer),
                Up::TxAck(pkt) => pkt.serialize(buffer),
            },
            Packet::Down(down) => match down {
                Down::PushAck(pkt) => pkt.serialize(buffer),
                Down::PullAck(pkt) => pkt.serialize(buffer),
                Down::PullResp(pkt) => pkt.serialize(buffer),
            },
        }
    }
}

fn write_preamble(w: &mut Cursor<&mut [u8]>, token: u16) -> Result {
    Ok(w.write_all(&[PROTOCOL_VERSION, (token >> 8) as u8, token as u8])?)
}

/// Up-frames (PUSH_DATA, PULL_DATA, TX_ACK) share a gateway-EUI preamble.
macro_rules! simple_up_packet {
    ($packet:ident, $ident:expr) => {
        impl $crate::codec::SerializablePacket for $packet {
            fn serialize(&self, buffer: &mut [u8]) -> $crate::codec::Result<u64> {
                let mut w = std::io::Cursor::new(buffer);
                $crate::codec::write_preamble(&mut w, self.random_token)?;
                std::io::Write::write_all(&mut w, &[$ident as u8])?;
                std::io::Write::write_all(&mut w, self.gateway_id.as_bytes())?;
                Ok(w.position())
            }
        }
    };
}

/// Down-frames that carry only a token and no body (PUSH_ACK, PULL_ACK).
macro_rules! simple_down_packet {
    ($packet:ident, $ident:expr) => {
        impl $crate::codec::SerializablePacket for $packet {
            fn serialize(&self, buffer: &mut [u8]) -> $crate::codec::Result<u64> {
                let mut w = std::io::Cursor::new(buffer);
                $crate::codec::write_preamble(&mut w, self.random_token)?;
                std::io::Write::write_all(&mut w, &[$ident as u8])?;
                Ok(w.position())
            }
        }
    };
}

pub(crate) use simple_down_packet;
pub(crate) use simple_up_packet;
