//! Core domain types: the radio-facing view of an uplink/downlink packet,
//! independent of how either is framed on the wire. Keeping this separate
//! from [`crate::codec`] means a bandwidth/coding-rate mixup or a wire
//! schema quirk can never leak into the scheduling logic in
//! [`crate::gateway`].
use crate::codec::{
    Bandwidth, CodingRate, DataRate, DatrValue, Modulation, RxPk, SpreadingFactor, TxPk, CRC,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::convert::TryFrom;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unsupported modulation/coding-rate combination for a LoRa frame")]
    MissingCodingRate,
    #[error("FSK frame is missing a numeric datr")]
    FskDatrNotNumeric,
}

fn hz_to_mhz(hz: u32) -> f64 {
    hz as f64 / 1_000_000.0
}

fn mhz_to_hz(mhz: f64) -> u32 {
    (mhz * 1_000_000.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcStatus {
    Ok,
    Fail,
    None,
}

impl From<CrcStatus> for CRC {
    fn from(status: CrcStatus) -> CRC {
        match status {
            CrcStatus::Ok => CRC::OK,
            CrcStatus::Fail => CRC::Fail,
            CrcStatus::None => CRC::Disabled,
        }
    }
}

impl From<CRC> for CrcStatus {
    fn from(crc: CRC) -> CrcStatus {
        match crc {
            CRC::OK => CrcStatus::Ok,
            CRC::Fail => CrcStatus::Fail,
            CRC::Disabled => CrcStatus::None,
        }
    }
}

/// Modulation-specific parameters, kept as a tagged union rather than a
/// flat struct with fields that only mean something for one branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RxModulation {
    Lora {
        bandwidth: Bandwidth,
        coding_rate: Option<CodingRate>,
        spreading_factor: SpreadingFactor,
    },
    Fsk {
        datarate_bps: u32,
    },
}

#[derive(Debug, Clone)]
pub struct RxPacket {
    pub time: Option<DateTime<Utc>>,
    /// Concentrator microsecond counter, stamped by the event loop at
    /// receive time relative to process start.
    pub count_us: u32,
    pub freq_hz: u32,
    pub modulation: RxModulation,
    pub rssi_dbm: i32,
    pub lora_snr_db: Option<f32>,
    pub stat_crc: CrcStatus,
    pub chain_if: u64,
    pub chain_rf: u64,
    pub data: Vec<u8>,
}

impl RxPacket {
    pub fn to_wire(&self) -> RxPk {
        let (modu, datr, codr, lsnr) = match self.modulation {
            RxModulation::Lora {
                bandwidth,
                coding_rate,
                spreading_factor,
            } => (
                Modulation::LORA,
                DatrValue::Lora(DataRate {
                    spreading_factor,
                    bandwidth,
                }),
                coding_rate,
                self.lora_snr_db,
            ),
            RxModulation::Fsk { datarate_bps } => {
                (Modulation::FSK, DatrValue::Fsk(datarate_bps), None, None)
            }
        };
        RxPk {
            time: self
                .time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true)),
            tmst: self.count_us,
            chan: self.chain_if,
            rfch: self.chain_rf,
            freq: hz_to_mhz(self.freq_hz),
            stat: self.stat_crc.into(),
            modu,
            datr,
            codr,
            lsnr,
            rssi: self.rssi_dbm,
            size: self.data.len() as u64,
            data: self.data.clone(),
        }
    }
}

impl TryFrom<&RxPk> for RxPacket {
    type Error = ModelError;

    fn try_from(rxpk: &RxPk) -> Result<Self, Self::Error> {
        let modulation = match rxpk.datr {
            DatrValue::Lora(DataRate {
                spreading_factor,
                bandwidth,
            }) => RxModulation::Lora {
                bandwidth,
                coding_rate: rxpk.codr,
                spreading_factor,
            },
            DatrValue::Fsk(datarate_bps) => RxModulation::Fsk { datarate_bps },
        };
        Ok(RxPacket {
            time: rxpk
                .time
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc)),
            count_us: rxpk.tmst,
            freq_hz: mhz_to_hz(rxpk.freq),
            modulation,
            rssi_dbm: rxpk.rssi,
            lora_snr_db: rxpk.lsnr,
            stat_crc: rxpk.stat.into(),
            chain_if: rxpk.chan,
            chain_rf: rxpk.rfch,
            data: rxpk.data.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TxModulation {
    Lora {
        bandwidth: Bandwidth,
        coding_rate: CodingRate,
        spreading_factor: SpreadingFactor,
    },
    Fsk {
        datarate_bps: u32,
        freq_dev_hz: u32,
    },
}

/// A downlink queued for transmission. `count_us` and `time_gps` are
/// ignored entirely when `immediate` is set.
#[derive(Debug, Clone)]
pub struct TxPacket {
    pub immediate: bool,
    pub count_us: u32,
    /// Parsed from `tmms` but never acted on; GPS-synchronised scheduling
    /// is out of scope.
    pub time_gps: Option<DateTime<Utc>>,
    pub freq_hz: u32,
    pub power_dbm: u8,
    pub modulation: TxModulation,
    pub invert_polar: bool,
    pub preamble_len: Option<u16>,
    pub no_crc: bool,
    pub data: Vec<u8>,
}

impl TxPacket {
    pub fn to_wire(&self) -> TxPk {
        let (modu, datr, codr, fdev) = match self.modulation {
            TxModulation::Lora {
                bandwidth,
                coding_rate,
                spreading_factor,
            } => (
                Modulation::LORA,
                DatrValue::Lora(DataRate {
                    spreading_factor,
                    bandwidth,
                }),
                Some(coding_rate),
                None,
            ),
            TxModulation::Fsk {
                datarate_bps,
                freq_dev_hz,
            } => (
                Modulation::FSK,
                DatrValue::Fsk(datarate_bps),
                None,
                Some((freq_dev_hz / 1000) as u64),
            ),
        };
        TxPk {
            imme: self.immediate,
            tmst: if self.immediate {
                None
            } else {
                Some(crate::codec::StringOrNum::N(self.count_us))
            },
            tmms: None,
            freq: hz_to_mhz(self.freq_hz),
            rfch: 0,
            powe: self.power_dbm as u64,
            modu,
            datr,
            codr,
            fdev,
            ipol: self.invert_polar,
            prea: self.preamble_len.map(|p| p as u64),
            data: self.data.clone(),
            size: self.data.len(),
            ncrc: if self.no_crc { Some(true) } else { None },
        }
    }
}

impl TryFrom<&TxPk> for TxPacket {
    type Error = ModelError;

    fn try_from(txpk: &TxPk) -> Result<Self, Self::Error> {
        let modulation = match txpk.datr {
            DatrValue::Lora(DataRate {
                spreading_factor,
                bandwidth,
            }) => TxModulation::Lora {
                bandwidth,
                coding_rate: txpk.codr.ok_or(ModelError::MissingCodingRate)?,
                spreading_factor,
            },
            DatrValue::Fsk(datarate_bps) => TxModulation::Fsk {
                datarate_bps,
                freq_dev_hz: txpk.fdev.unwrap_or(0) as u32 * 1000,
            },
        };
        Ok(TxPacket {
            immediate: txpk.imme,
            count_us: txpk.tmst().unwrap_or(0),
            time_gps: None,
            freq_hz: mhz_to_hz(txpk.freq),
            // scheduled downlinks are clamped to 14 dBm by the core (§4.2);
            // the wire value is carried through unclamped here.
            power_dbm: txpk.powe as u8,
            modulation,
            invert_polar: txpk.ipol,
            preamble_len: txpk.prea.map(|p| p as u16),
            no_crc: txpk.ncrc.unwrap_or(false),
            data: txpk.data.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::SpreadingFactor;

    #[test]
    fn rxpacket_wire_roundtrip_preserves_frequency() {
        let rxpacket = RxPacket {
            time: None,
            count_us: 12345,
            freq_hz: 868_100_000,
            modulation: RxModulation::Lora {
                bandwidth: Bandwidth::Bw125,
                coding_rate: Some(CodingRate::Cr4_5),
                spreading_factor: SpreadingFactor::SF12,
            },
            rssi_dbm: -80,
            lora_snr_db: Some(7.5),
            stat_crc: CrcStatus::Ok,
            chain_if: 0,
            chain_rf: 0,
            data: b"hello".to_vec(),
        };
        let wire = rxpacket.to_wire();
        assert_eq!(wire.freq, 868.1);
        let back = RxPacket::try_from(&wire).unwrap();
        assert_eq!(back.freq_hz, 868_100_000);
    }

    #[test]
    fn txpacket_from_wire_rejects_missing_lora_coding_rate() {
        let txpk = TxPk {
            imme: true,
            tmst: None,
            tmms: None,
            freq: 868.1,
            rfch: 0,
            powe: 14,
            modu: Modulation::LORA,
            datr: DatrValue::Lora(DataRate {
                spreading_factor: SpreadingFactor::SF7,
                bandwidth: Bandwidth::Bw125,
            }),
            codr: None,
            fdev: None,
            ipol: false,
            prea: None,
            data: vec![1, 2, 3],
            size: 3,
            ncrc: None,
        };
        assert!(TxPacket::try_from(&txpk).is_err());
    }
}
