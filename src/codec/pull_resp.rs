//! ### PULL_RESP ###
//! Sent by the server to deliver a downlink frame the gateway must transmit.
//!
//! ```text
//! Bytes  | Function
//! 0      | protocol version = 2
//! 1-2    | random token
//! 3      | PULL_RESP identifier 0x03
//! 4-end  | JSON object
//! ```
use super::types::{CodingRate, DatrValue, Modulation, StringOrNum};
use super::{tx_ack, write_preamble, GatewayId, Identifier, SerializablePacket};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Write};

#[derive(Debug, Clone)]
pub struct Packet {
    pub random_token: u16,
    pub data: Data,
}

impl Packet {
    pub fn into_ack_for_gateway(self, gateway_id: GatewayId) -> tx_ack::Packet {
        tx_ack::Packet {
            gateway_id,
            random_token: self.random_token,
            data: tx_ack::Data::default(),
        }
    }

    pub fn into_nack_for_gateway(
        self,
        error: super::TxAckError,
        gateway_id: GatewayId,
    ) -> tx_ack::Packet {
        tx_ack::Packet {
            gateway_id,
            random_token: self.random_token,
            data: tx_ack::Data::with_error(error),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Data {
    pub txpk: TxPk,
}

/// ```text
/// imme | bool   | send immediately, ignoring tmst/time
/// tmst | number | send at a given concentrator timestamp
/// tmms | number | send at a given GPS time (unused here)
/// freq | number | TX central frequency in MHz
/// rfch | number | concentrator RF chain used for TX
/// powe | number | TX output power in dBm
/// modu | string | "LORA" or "FSK"
/// datr | string | LoRa datarate, e.g. SF12BW500
/// datr | number | FSK bit rate
/// codr | string | LoRa coding rate (LoRa only)
/// fdev | number | FSK frequency deviation in Hz
/// ipol | bool   | LoRa polarity inversion
/// prea | number | preamble length
/// size | number | payload size in bytes
/// data | string | base64 payload
/// ncrc | bool   | disable the physical-layer CRC
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TxPk {
    pub imme: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmst: Option<StringOrNum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmms: Option<StringOrNum>,
    pub freq: f64,
    pub rfch: u64,
    pub powe: u64,
    pub modu: Modulation,
    pub datr: DatrValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codr: Option<CodingRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fdev: Option<u64>,
    pub ipol: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prea: Option<u64>,
    #[serde(with = "super::types::base64_bytes")]
    pub data: Vec<u8>,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncrc: Option<bool>,
}

impl TxPk {
    pub fn is_immediate(&self) -> bool {
        self.imme
    }

    pub fn tmst(&self) -> Option<u32> {
        self.tmst.as_ref().and_then(StringOrNum::as_u32)
    }
}

impl fmt::Display for TxPk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}, {:.2} MHz, {:?}, len: {}",
            match self.tmst() {
                Some(t) => format!("@{t} us"),
                None => "immediately".into(),
            },
            self.freq,
            self.datr,
            self.data.len()
        )
    }
}

impl SerializablePacket for Packet {
    fn serialize(&self, buffer: &mut [u8]) -> super::Result<u64> {
        let mut w = Cursor::new(buffer);
        write_preamble(&mut w, self.random_token)?;
        w.write_all(&[Identifier::PullResp as u8])?;
        w.write_all(serde_json::to_string(&self.data)?.as_bytes())?;
        Ok(w.position())
    }
}

impl From<Packet> for super::Packet {
    fn from(packet: Packet) -> super::Packet {
        super::Packet::Down(super::Down::PullResp(Box::new(packet)))
    }
}

impl From<Box<Packet>> for super::Packet {
    fn from(packet: Box<Packet>) -> super::Packet {
        super::Packet::Down(super::Down::PullResp(packet))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn immediate_send_with_string_tmst() {
        let json = "{\"codr\":\"4/5\",\"data\":\"IHLF2EA+n8BFY1vrCU1k/Vg=\",\"datr\":\"SF10BW125\",\"freq\":904.1,\"imme\":true,\"ipol\":false,\"modu\":\"LORA\",\"powe\":27,\"rfch\":0,\"size\":17,\"tmst\":\"immediate\"}";
        let txpk: TxPk = serde_json::from_str(json).expect("parse txpk");
        assert!(txpk.is_immediate());
        assert_eq!(txpk.tmst(), None);
    }

    #[test]
    fn timed_send_reports_tmst() {
        let json = "{\"codr\":\"4/5\",\"data\":\"IHLF2EA+n8BFY1vrCU1k/Vg=\",\"datr\":\"SF10BW500\",\"freq\":926.9,\"imme\":false,\"ipol\":true,\"modu\":\"LORA\",\"powe\":27,\"rfch\":0,\"size\":17,\"tmst\":727050748}";
        let txpk: TxPk = serde_json::from_str(json).expect("parse txpk");
        assert!(!txpk.is_immediate());
        assert_eq!(txpk.tmst(), Some(727050748));
    }
}
