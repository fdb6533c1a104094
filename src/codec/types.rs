//! Shared wire-level value types: bandwidth/coding-rate/modulation tokens,
//! the gateway EUI newtype, and the TX_ACK error code table.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::TryFrom;
use std::fmt;

/// LoRa channel bandwidth, enumerated 1..10 per the Semtech wire table.
/// `Display`/`token()` render the fragment used inside a `datr` string
/// (`SF7BW125`) and inside a channel-plan `bandwidth` field (`BW125`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bandwidth {
    Bw7_8 = 1,
    Bw10_4 = 2,
    Bw15_6 = 3,
    Bw20_8 = 4,
    Bw31_2 = 5,
    Bw41_7 = 6,
    Bw62_5 = 7,
    Bw125 = 8,
    Bw250 = 9,
    Bw500 = 10,
}

impl Bandwidth {
    /// The numeric fragment of the wire token, e.g. `"7.8"` or `"125"`.
    pub fn token(&self) -> &'static str {
        match self {
            Bandwidth::Bw7_8 => "7.8",
            Bandwidth::Bw10_4 => "10.4",
            Bandwidth::Bw15_6 => "15.6",
            Bandwidth::Bw20_8 => "20.8",
            Bandwidth::Bw31_2 => "31.2",
            Bandwidth::Bw41_7 => "41.7",
            Bandwidth::Bw62_5 => "62.5",
            Bandwidth::Bw125 => "125",
            Bandwidth::Bw250 => "250",
            Bandwidth::Bw500 => "500",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Some(match s {
            "7.8" => Bandwidth::Bw7_8,
            "10.4" => Bandwidth::Bw10_4,
            "15.6" => Bandwidth::Bw15_6,
            "20.8" => Bandwidth::Bw20_8,
            "31.2" => Bandwidth::Bw31_2,
            "41.7" => Bandwidth::Bw41_7,
            "62.5" => Bandwidth::Bw62_5,
            "125" => Bandwidth::Bw125,
            "250" => Bandwidth::Bw250,
            "500" => Bandwidth::Bw500,
            _ => return None,
        })
    }

    /// Channel width in Hz, as carried in `SX127X_conf.bandwidth`.
    pub fn hz(&self) -> u32 {
        match self {
            Bandwidth::Bw7_8 => 7_800,
            Bandwidth::Bw10_4 => 10_400,
            Bandwidth::Bw15_6 => 15_600,
            Bandwidth::Bw20_8 => 20_800,
            Bandwidth::Bw31_2 => 31_200,
            Bandwidth::Bw41_7 => 41_700,
            Bandwidth::Bw62_5 => 62_500,
            Bandwidth::Bw125 => 125_000,
            Bandwidth::Bw250 => 250_000,
            Bandwidth::Bw500 => 500_000,
        }
    }

    pub fn from_hz(hz: u32) -> Option<Self> {
        Some(match hz {
            7_800 => Bandwidth::Bw7_8,
            10_400 => Bandwidth::Bw10_4,
            15_600 => Bandwidth::Bw15_6,
            20_800 => Bandwidth::Bw20_8,
            31_200 => Bandwidth::Bw31_2,
            41_700 => Bandwidth::Bw41_7,
            62_500 => Bandwidth::Bw62_5,
            125_000 => Bandwidth::Bw125,
            250_000 => Bandwidth::Bw250,
            500_000 => Bandwidth::Bw500,
            _ => return None,
        })
    }
}

impl TryFrom<u8> for Bandwidth {
    type Error = ();
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Bandwidth::Bw7_8,
            2 => Bandwidth::Bw10_4,
            3 => Bandwidth::Bw15_6,
            4 => Bandwidth::Bw20_8,
            5 => Bandwidth::Bw31_2,
            6 => Bandwidth::Bw41_7,
            7 => Bandwidth::Bw62_5,
            8 => Bandwidth::Bw125,
            9 => Bandwidth::Bw250,
            10 => Bandwidth::Bw500,
            _ => return Err(()),
        })
    }
}

/// LoRa forward-error-correction rate. Encodes to the canonical `4/N`
/// token; decodes the legacy aliases original gateways also emit
/// (`2/3` for `4/6`, `2/4`/`1/2` for `4/8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CodingRate {
    Cr4_5 = 5,
    Cr4_6 = 6,
    Cr4_7 = 7,
    Cr4_8 = 8,
}

impl CodingRate {
    pub fn token(&self) -> &'static str {
        match self {
            CodingRate::Cr4_5 => "4/5",
            CodingRate::Cr4_6 => "4/6",
            CodingRate::Cr4_7 => "4/7",
            CodingRate::Cr4_8 => "4/8",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Some(match s {
            "4/5" => CodingRate::Cr4_5,
            "4/6" | "2/3" => CodingRate::Cr4_6,
            "4/7" => CodingRate::Cr4_7,
            "4/8" | "2/4" | "1/2" => CodingRate::Cr4_8,
            _ => return None,
        })
    }
}

impl TryFrom<u8> for CodingRate {
    type Error = ();
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            5 => CodingRate::Cr4_5,
            6 => CodingRate::Cr4_6,
            7 => CodingRate::Cr4_7,
            8 => CodingRate::Cr4_8,
            _ => return Err(()),
        })
    }
}

impl Serialize for CodingRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for CodingRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <&str>::deserialize(deserializer)?;
        CodingRate::from_token(s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown coding rate {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpreadingFactor {
    SF7 = 7,
    SF8 = 8,
    SF9 = 9,
    SF10 = 10,
    SF11 = 11,
    SF12 = 12,
}

impl SpreadingFactor {
    pub fn number(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for SpreadingFactor {
    type Error = ();
    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Ok(match n {
            7 => SpreadingFactor::SF7,
            8 => SpreadingFactor::SF8,
            9 => SpreadingFactor::SF9,
            10 => SpreadingFactor::SF10,
            11 => SpreadingFactor::SF11,
            12 => SpreadingFactor::SF12,
            _ => return Err(()),
        })
    }
}

/// The LoRa `datr` wire token, `SF<sf>BW<bw>`, e.g. `SF12BW125`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRate {
    pub spreading_factor: SpreadingFactor,
    pub bandwidth: Bandwidth,
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SF{}BW{}",
            self.spreading_factor.number(),
            self.bandwidth.token()
        )
    }
}

impl Serialize for DataRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DataRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <&str>::deserialize(deserializer)?;
        let rest = s
            .strip_prefix("SF")
            .ok_or_else(|| serde::de::Error::custom(format!("malformed datr {s}")))?;
        let bw_at = rest
            .find("BW")
            .ok_or_else(|| serde::de::Error::custom(format!("malformed datr {s}")))?;
        let (sf_s, bw_s) = (&rest[..bw_at], &rest[bw_at + 2..]);
        let sf: u8 = sf_s
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("malformed spreading factor {sf_s}")))?;
        Ok(DataRate {
            spreading_factor: SpreadingFactor::try_from(sf).map_err(|_| {
                serde::de::Error::custom(format!("unsupported spreading factor {sf}"))
            })?,
            bandwidth: Bandwidth::from_token(bw_s)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown bandwidth {bw_s}")))?,
        })
    }
}

/// `datr` is a LoRa string or an FSK bit rate, depending on `modu`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatrValue {
    Lora(DataRate),
    Fsk(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modulation {
    LORA,
    FSK,
}

/// `tmst`/`tmms` carry either the literal string `"immediate"` or a
/// numeric timestamp, depending on gateway firmware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrNum {
    S(String),
    N(u32),
}

impl StringOrNum {
    pub fn immediate() -> Self {
        StringOrNum::S("immediate".to_string())
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, StringOrNum::S(_))
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            StringOrNum::N(n) => Some(*n),
            StringOrNum::S(_) => None,
        }
    }
}

/// The eight TX_ACK rejection codes, serialized as `{"error": "<CODE>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxAckError {
    NONE,
    TOO_LATE,
    TOO_EARLY,
    COLLISION_PACKET,
    COLLISION_BEACON,
    TX_FREQ,
    TX_POWER,
    GPS_UNLOCKED,
}

/// Parses a 16-hex-character gateway EUI into its 8 big-endian bytes.
pub fn parse_gateway_id_hex(s: &str) -> Option<[u8; 8]> {
    if s.len() != 16 {
        return None;
    }
    let mut bytes = [0u8; 8];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(bytes)
}

pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
