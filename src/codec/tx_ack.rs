//! ### TX_ACK ###
//! Sent by the gateway to report whether a PULL_RESP downlink was accepted
//! into its TX queue. A missing JSON body means acceptance with no error.
//!
//! ```text
//! Bytes  | Function
//! 0      | protocol version = 2
//! 1-2    | token of the PULL_RESP being acknowledged
//! 3      | TX_ACK identifier 0x05
//! 4-11   | gateway EUI
//! 12-end | [optional] JSON object
//! ```
use super::{GatewayId, Identifier, SerializablePacket, TxAckError};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};

#[derive(Debug, Clone)]
pub struct Packet {
    pub random_token: u16,
    pub gateway_id: GatewayId,
    pub data: Data,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Data {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txpk_ack: Option<TxAckBody>,
}

impl Data {
    pub fn with_error(error: TxAckError) -> Data {
        Data {
            txpk_ack: Some(TxAckBody { error }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TxAckBody {
    pub error: TxAckError,
}

impl SerializablePacket for Packet {
    fn serialize(&self, buffer: &mut [u8]) -> super::Result<u64> {
        let mut w = Cursor::new(buffer);
        super::write_preamble(&mut w, self.random_token)?;
        w.write_all(&[Identifier::TxAck as u8])?;
        w.write_all(self.gateway_id.as_bytes())?;
        if self.data.txpk_ack.is_some() {
            w.write_all(serde_json::to_string(&self.data)?.as_bytes())?;
        }
        Ok(w.position())
    }
}

impl From<Packet> for super::Packet {
    fn from(packet: Packet) -> super::Packet {
        super::Packet::Up(super::Up::TxAck(packet))
    }
}
