//! §4.4 Upstream emitter: encode once, write to every enabled server
//! independently. A write failure on one destination never prevents the
//! others; there are no retries and no PUSH_ACK waiting.
use crate::codec::{Packet, SerializablePacket};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::warn;

pub async fn send_to_all(socket: &UdpSocket, servers: &[SocketAddr], packet: &Packet) {
    let mut buf = [0u8; 2048];
    let len = match packet.serialize(&mut buf) {
        Ok(len) => len as usize,
        Err(error) => {
            warn!(%error, "failed to encode upstream packet");
            return;
        }
    };
    for &server in servers {
        if let Err(error) = socket.send_to(&buf[..len], server).await {
            warn!(%error, %server, "failed to send upstream packet");
        }
    }
}
