//! ### PULL_DATA ###
//! Sent periodically by the gateway to keep the NAT binding (if any) open
//! and let the server learn where to reach it for downlinks.
//!
//! ```text
//! Bytes  | Function
//! 0      | protocol version = 2
//! 1-2    | random token
//! 3      | PULL_DATA identifier 0x02
//! 4-11   | gateway EUI
//! ```
use super::{pull_ack, simple_up_packet, GatewayId, Identifier};

#[derive(Debug, Clone)]
pub struct Packet {
    pub random_token: u16,
    pub gateway_id: GatewayId,
}

simple_up_packet!(Packet, Identifier::PullData);

impl From<Packet> for super::Packet {
    fn from(packet: Packet) -> super::Packet {
        super::Packet::Up(super::Up::PullData(packet))
    }
}

impl Packet {
    pub fn into_ack(self) -> pull_ack::Packet {
        pull_ack::Packet {
            random_token: self.random_token,
        }
    }
}
