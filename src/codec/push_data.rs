//! ### PUSH_DATA ###
//! Used by the gateway to forward received RF packets, and periodically its
//! own statistics, to the network server.
//!
//! ```text
//! Bytes  | Function
//! 0      | protocol version = 2
//! 1-2    | random token
//! 3      | PUSH_DATA identifier 0x00
//! 4-11   | gateway EUI
//! 12-end | JSON object
//! ```
use super::types::{CodingRate, DatrValue, Modulation};
use super::{push_ack, write_preamble, GatewayId, Identifier, SerializablePacket};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::io::{Cursor, Write};

#[derive(Debug, Clone)]
pub struct Packet {
    pub random_token: u16,
    pub gateway_id: GatewayId,
    pub data: Data,
}

impl Packet {
    pub fn from_rxpk(gateway_id: GatewayId, rxpk: Vec<RxPk>) -> Packet {
        Packet {
            random_token: rand::random(),
            gateway_id,
            data: Data {
                rxpk: if rxpk.is_empty() { None } else { Some(rxpk) },
                stat: None,
            },
        }
    }

    pub fn from_stat(gateway_id: GatewayId, stat: Stat) -> Packet {
        Packet {
            random_token: rand::random(),
            gateway_id,
            data: Data {
                rxpk: None,
                stat: Some(stat),
            },
        }
    }

    pub fn into_ack(self) -> push_ack::Packet {
        push_ack::Packet {
            random_token: self.random_token,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Data {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rxpk: Option<Vec<RxPk>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat: Option<Stat>,
}

/// PHY CRC status for a received packet: `1` valid, `-1` failed, `0` none.
#[derive(Debug, Serialize_repr, Deserialize_repr, Copy, Clone, PartialEq, Eq)]
#[repr(i8)]
pub enum CRC {
    Disabled = 0,
    OK = 1,
    Fail = -1,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RxPk {
    /// UTC time of reception, when the radio clock has been disciplined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Internal timestamp of the "RX finished" event, 32-bit microsecond counter.
    pub tmst: u32,
    pub chan: u64,
    pub rfch: u64,
    /// RX central frequency in MHz, 3-decimal (Hz) precision.
    pub freq: f64,
    pub stat: CRC,
    pub modu: Modulation,
    pub datr: DatrValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codr: Option<CodingRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsnr: Option<f32>,
    pub rssi: i32,
    pub size: u64,
    #[serde(with = "super::types::base64_bytes")]
    pub data: Vec<u8>,
}

/// Gateway statistics. Field order matches the Semtech reference exactly —
/// some network servers parse this object positionally.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Stat {
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lati: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alti: Option<i64>,
    pub rxnb: u64,
    pub rxok: u64,
    pub rxfw: u64,
    /// Percentage of upstream datagrams acked since the last status tick;
    /// `null` when none were sent.
    pub ackr: Option<f64>,
    pub dwnb: u64,
    pub txnb: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
}

impl SerializablePacket for Packet {
    fn serialize(&self, buffer: &mut [u8]) -> super::Result<u64> {
        let mut w = Cursor::new(buffer);
        write_preamble(&mut w, self.random_token)?;
        w.write_all(&[Identifier::PushData as u8])?;
        w.write_all(self.gateway_id.as_bytes())?;
        w.write_all(serde_json::to_string(&self.data)?.as_bytes())?;
        Ok(w.position())
    }
}

impl From<Packet> for super::Packet {
    fn from(packet: Packet) -> super::Packet {
        super::Packet::Up(super::Up::PushData(packet))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rxpk_roundtrip_preserves_snr() {
        let json = "{\"rxpk\":[{\"tmst\":445296860,\"chan\":0,\"rfch\":0,\"freq\":868.5,\"stat\":1,\"modu\":\"LORA\",\"datr\":\"SF12BW125\",\"codr\":\"4/5\",\"lsnr\":7.8,\"rssi\":-103,\"size\":29,\"data\":\"QC65rwEA4w8CaH7LyGf/3+dxzrXkkfEsRCcXbFM=\"}]}";
        let parsed: Data = serde_json::from_str(json).expect("parse push_data::Data");
        let rxpk = parsed.rxpk.expect("rxpk present");
        assert_eq!(rxpk.len(), 1);
        assert_eq!(rxpk[0].lsnr, Some(7.8));

        let serialized = serde_json::to_string(&Data {
            rxpk: Some(rxpk),
            stat: None,
        })
        .expect("serialize push_data::Data");
        let reparsed: Data = serde_json::from_str(&serialized).expect("reparse push_data::Data");
        assert_eq!(reparsed.rxpk.unwrap()[0].lsnr, Some(7.8));
    }

    #[test]
    fn stat_ackr_nulls_when_no_upstream_sent() {
        let json = "{\"stat\":{\"time\":\"2021-03-17 18:46:31 GMT\",\"rxnb\":0,\"rxok\":0,\"rxfw\":0,\"ackr\":null,\"dwnb\":0,\"txnb\":0}}";
        let parsed: Data = serde_json::from_str(json).expect("parse push_data::Data");
        assert_eq!(parsed.stat.unwrap().ackr, None);
    }
}
