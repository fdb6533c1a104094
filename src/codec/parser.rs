use super::*;
use std::convert::TryFrom;

const PROTOCOL_VERSION_INDEX: usize = 0;
const IDENTIFIER_INDEX: usize = 3;
const GATEWAY_ID_START: usize = 4;
const PAYLOAD_START: usize = 12;

fn random_token(buffer: &[u8]) -> u16 {
    (buffer[1] as u16) << 8 | buffer[2] as u16
}

fn gateway_id(buffer: &[u8]) -> GatewayId {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buffer[GATEWAY_ID_START..GATEWAY_ID_START + 8]);
    GatewayId::from(bytes)
}

/// Strips a trailing NUL byte some packet forwarders append after the JSON
/// body.
fn terminate(buf: &[u8]) -> usize {
    if buf.last() == Some(&0) {
        buf.len() - 1
    } else {
        buf.len()
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(
    identifier: Identifier,
    buffer: &[u8],
) -> std::result::Result<T, ParseError> {
    let json_str = std::str::from_utf8(&buffer[..terminate(buffer)])?;
    serde_json::from_str(json_str).map_err(|json_error| ParseError::InvalidJson {
        identifier,
        json_str: json_str.into(),
        json_error,
    })
}

pub trait Parser {
    fn parse(buffer: &[u8]) -> std::result::Result<Packet, ParseError>;
}

impl Packet {
    pub fn parse_uplink(buffer: &[u8]) -> std::result::Result<Up, ParseError> {
        match Self::parse(buffer)? {
            Packet::Up(up) => Ok(up),
            Packet::Down(down) => Err(ParseError::UnexpectedDownlink(down)),
        }
    }

    pub fn parse_downlink(buffer: &[u8]) -> std::result::Result<Down, ParseError> {
        match Self::parse(buffer)? {
            Packet::Down(down) => Ok(down),
            Packet::Up(up) => Err(ParseError::UnexpectedUplink(Box::new(up))),
        }
    }
}

impl Parser for Packet {
    fn parse(buffer: &[u8]) -> std::result::Result<Packet, ParseError> {
        if buffer.len() < 4 {
            return Err(ParseError::Truncated);
        }
        if buffer[PROTOCOL_VERSION_INDEX] != PROTOCOL_VERSION {
            return Err(ParseError::InvalidProtocolVersion);
        }

        let id = Identifier::try_from(buffer[IDENTIFIER_INDEX])
            .map_err(|_| ParseError::InvalidIdentifier)?;
        let random_token = random_token(buffer);

        Ok(match id {
            Identifier::PullData => {
                if buffer.len() < PAYLOAD_START {
                    return Err(ParseError::Truncated);
                }
                pull_data::Packet {
                    random_token,
                    gateway_id: gateway_id(buffer),
                }
                .into()
            }
            Identifier::PushData => {
                if buffer.len() < PAYLOAD_START {
                    return Err(ParseError::Truncated);
                }
                push_data::Packet {
                    random_token,
                    gateway_id: gateway_id(buffer),
                    data: parse_json(id, &buffer[PAYLOAD_START..])?,
                }
                .into()
            }
            Identifier::TxAck => {
                if buffer.len() < PAYLOAD_START {
                    return Err(ParseError::Truncated);
                }
                let body = &buffer[PAYLOAD_START..];
                // some packet forwarders append a lone 0 byte instead of omitting the body
                let data = if body.is_empty() || (body.len() == 1 && body[0] == 0) {
                    tx_ack::Data::default()
                } else {
                    parse_json(id, body)?
                };
                tx_ack::Packet {
                    random_token,
                    gateway_id: gateway_id(buffer),
                    data,
                }
                .into()
            }
            Identifier::PushAck => push_ack::Packet { random_token }.into(),
            Identifier::PullAck => pull_ack::Packet { random_token }.into(),
            Identifier::PullResp => {
                if buffer.len() < 4 {
                    return Err(ParseError::Truncated);
                }
                pull_resp::Packet {
                    random_token,
                    data: parse_json(id, &buffer[4..])?,
                }
                .into()
            }
        })
    }
}
