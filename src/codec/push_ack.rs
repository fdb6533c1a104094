//! ### PUSH_ACK ###
//! Sent by the server to confirm receipt of a PUSH_DATA frame.
//!
//! ```text
//! Bytes  | Function
//! 0      | protocol version = 2
//! 1-2    | token of the PUSH_DATA being acknowledged
//! 3      | PUSH_ACK identifier 0x01
//! ```
use super::{simple_down_packet, Identifier};

#[derive(Debug, Clone)]
pub struct Packet {
    pub random_token: u16,
}

simple_down_packet!(Packet, Identifier::PushAck);

impl From<Packet> for super::Packet {
    fn from(packet: Packet) -> super::Packet {
        super::Packet::Down(super::Down::PushAck(packet))
    }
}
