//! Best-effort LoRaWAN MHDR peek, used only to enrich log lines. A decode
//! failure never affects the opaque payload forwarded upstream/downstream.

/// LoRaWAN R1 is encoded in the bottom two bits of the MHDR.
const LORAWAN_R1: u8 = 0b00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MType {
    JoinRequest,
    JoinAccept,
    UnconfirmedDataUp,
    UnconfirmedDataDown,
    ConfirmedDataUp,
    ConfirmedDataDown,
    Rfu,
    Proprietary,
}

impl MType {
    fn from_bits(bits: u8) -> MType {
        match bits {
            0 => MType::JoinRequest,
            1 => MType::JoinAccept,
            2 => MType::UnconfirmedDataUp,
            3 => MType::UnconfirmedDataDown,
            4 => MType::ConfirmedDataUp,
            5 => MType::ConfirmedDataDown,
            6 => MType::Rfu,
            _ => MType::Proprietary,
        }
    }
}

/// Decodes the MHDR byte at the start of a LoRaWAN PHYPayload. Returns
/// `None` for an empty payload or a major version other than LoRaWAN R1.
pub fn decode_mhdr(payload: &[u8]) -> Option<MType> {
    let mhdr = *payload.first()?;
    if mhdr & 0b11 != LORAWAN_R1 {
        return None;
    }
    Some(MType::from_bits(mhdr >> 5))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_unconfirmed_data_up() {
        // MType = 2 (0b010) in the top 3 bits, major = LoRaWAN R1 (0b00).
        let mhdr = 0b010_000_00;
        assert_eq!(decode_mhdr(&[mhdr, 1, 2, 3]), Some(MType::UnconfirmedDataUp));
    }

    #[test]
    fn empty_payload_decodes_to_none() {
        assert_eq!(decode_mhdr(&[]), None);
    }

    #[test]
    fn unknown_major_version_decodes_to_none() {
        let mhdr = 0b010_000_01;
        assert_eq!(decode_mhdr(&[mhdr]), None);
    }
}
