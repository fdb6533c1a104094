//! ### PULL_ACK ###
//! Sent by the server to confirm the NAT route is open and PULL_RESP
//! downlinks may arrive at any time.
//!
//! ```text
//! Bytes  | Function
//! 0      | protocol version = 2
//! 1-2    | token of the PULL_DATA being acknowledged
//! 3      | PULL_ACK identifier 0x04
//! ```
use super::{simple_down_packet, Identifier};

#[derive(Debug, Clone)]
pub struct Packet {
    pub random_token: u16,
}

simple_down_packet!(Packet, Identifier::PullAck);

impl From<Packet> for super::Packet {
    fn from(packet: Packet) -> super::Packet {
        super::Packet::Down(super::Down::PullAck(packet))
    }
}
