//! §4.5 Downstream receiver: a single reader loop on the shared UDP socket.
use crate::codec::{Down, GatewayId, Packet, Parser, SerializablePacket, TxAckError};
use crate::mhdr;
use crate::model::TxPacket;
use std::convert::TryFrom;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Datagrams larger than this are dropped with a log line rather than
/// risking a truncated read.
const MAX_DATAGRAM: usize = 2048;

#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("socket read error: {0}")]
    Recv(#[from] std::io::Error),
}

/// Events the downstream reader hands to the event loop. Statistics stay
/// owned exclusively by the event loop (§3 Ownership), so an observed ack
/// is reported as an event rather than mutated here.
pub enum DownstreamEvent {
    Downlink(TxPacket),
    UpstreamAcked,
    DatagramReceived,
}

/// Reads one datagram at a time, routes PULL_RESP into `events`, and
/// replies with a TX_ACK carrying the same token before the caller ever
/// sees the decoded packet — the gateway reports acceptance, not
/// post-transmit success.
pub async fn run(
    socket: Arc<UdpSocket>,
    gateway_id: GatewayId,
    events: mpsc::Sender<DownstreamEvent>,
) -> Result<(), DownstreamError> {
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let (len, origin) = socket.recv_from(&mut buf).await?;
        if len > MAX_DATAGRAM {
            warn!(len, %origin, "dropping oversize downstream datagram");
            continue;
        }

        match Packet::parse_downlink(&buf[..len]) {
            Ok(Down::PushAck(_)) | Ok(Down::PullAck(_)) => {
                if events.send(DownstreamEvent::DatagramReceived).await.is_err() {
                    return Ok(());
                }
                if events.send(DownstreamEvent::UpstreamAcked).await.is_err() {
                    return Ok(());
                }
            }
            Ok(Down::PullResp(pull_resp)) => {
                if events.send(DownstreamEvent::DatagramReceived).await.is_err() {
                    return Ok(());
                }
                let token = pull_resp.random_token;
                match TxPacket::try_from(&pull_resp.data.txpk) {
                    Ok(txpacket) => {
                        if let Some(mtype) = mhdr::decode_mhdr(&txpacket.data) {
                            debug!(token, ?mtype, "accepted downlink");
                        }
                        if events
                            .send(DownstreamEvent::Downlink(txpacket))
                            .await
                            .is_err()
                        {
                            return Ok(());
                        }
                        let ack: Packet = pull_resp.into_ack_for_gateway(gateway_id).into();
                        send_reply(&socket, origin, &ack).await;
                    }
                    Err(error) => {
                        warn!(token, %error, "rejecting undecodable downlink");
                        let nack: Packet = pull_resp
                            .into_nack_for_gateway(TxAckError::TX_FREQ, gateway_id)
                            .into();
                        send_reply(&socket, origin, &nack).await;
                    }
                }
            }
            Err(error) => {
                debug!(%error, %origin, "dropping malformed downstream datagram");
            }
        }
    }
}

async fn send_reply(socket: &UdpSocket, origin: SocketAddr, packet: &Packet) {
    let mut buf = [0u8; 512];
    match packet.serialize(&mut buf) {
        Ok(len) => {
            if let Err(error) = socket.send_to(&buf[..len as usize], origin).await {
                warn!(%error, %origin, "failed to send TX_ACK");
            }
        }
        Err(error) => warn!(%error, "failed to encode TX_ACK"),
    }
}
