//! §4.6 Event loop / scheduler: the single logical thread that owns the
//! radio, the TX queue and the statistics counters, multiplexed with
//! `tokio::select!` exactly as the rest of the pack's gateway-shaped
//! binaries do.
use super::downstream::DownstreamEvent;
use super::upstream;
use crate::codec::{pull_data, push_data, GatewayId, Packet, RxPk};
use crate::mhdr;
use crate::model::CrcStatus;
use crate::queue::{TxQueue, MAX_QUEUE_LEN};
use crate::radio::{RadioAdapter, RadioConfig, RadioError};
use crate::stats::Statistics;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("radio bring-up failed: {0}")]
    RadioBringUp(#[source] RadioError),
    #[error("radio runtime failure: {0}")]
    RadioRuntime(#[source] RadioError),
}

/// Scheduled (non-immediate) downlinks are clamped to this TX power.
const SCHEDULED_POWER_CAP_DBM: u8 = 14;

pub struct GatewayCore {
    pub gateway_id: GatewayId,
    pub servers: Vec<SocketAddr>,
    pub socket: Arc<UdpSocket>,
    pub radio: Box<dyn RadioAdapter>,
    pub radio_config: RadioConfig,
    pub queue: TxQueue,
    pub stats: Statistics,
    pub keepalive_interval: Duration,
    pub status_interval: Duration,
    pub check_received_interval: Duration,
    base_time: Instant,
}

impl GatewayCore {
    pub fn new(
        gateway_id: GatewayId,
        servers: Vec<SocketAddr>,
        socket: Arc<UdpSocket>,
        radio: Box<dyn RadioAdapter>,
        radio_config: RadioConfig,
        stats: Statistics,
        keepalive_interval: Duration,
        status_interval: Duration,
    ) -> Self {
        GatewayCore {
            gateway_id,
            servers,
            socket,
            radio,
            radio_config,
            queue: TxQueue::new(),
            stats,
            keepalive_interval,
            status_interval,
            check_received_interval: Duration::from_millis(500),
            base_time: Instant::now(),
        }
    }

    /// Runs until the radio reports a fatal error or the downstream
    /// reader's channel closes. Applies the radio configuration, then emits
    /// the startup PULL_DATA handshake before arming receive, per §4.6.
    pub async fn run(mut self, mut tx_in: mpsc::Receiver<DownstreamEvent>) -> Result<(), CoreError> {
        self.radio
            .configure(self.radio_config)
            .await
            .map_err(CoreError::RadioBringUp)?;
        self.send_keepalive().await;
        self.radio
            .start_receive(self.radio_config)
            .await
            .map_err(CoreError::RadioBringUp)?;

        let mut timer_receive = interval(self.check_received_interval);
        let mut ticker_keepalive = interval(self.keepalive_interval);
        let mut ticker_status = interval(self.status_interval);
        let mut send_deadline = self.next_send_deadline();

        loop {
            let send_sleep = async {
                match send_deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                event = tx_in.recv() => {
                    match event {
                        Some(DownstreamEvent::Downlink(packet)) => {
                            self.handle_downlink(packet).await?;
                            send_deadline = self.next_send_deadline();
                        }
                        Some(DownstreamEvent::UpstreamAcked) => {
                            self.stats.record_upstream_acked();
                        }
                        Some(DownstreamEvent::DatagramReceived) => {
                            self.stats.record_downstream_datagram();
                        }
                        None => {
                            info!("downstream reader channel closed, stopping event loop");
                            return Ok(());
                        }
                    }
                }
                _ = timer_receive.tick() => {
                    self.poll_and_forward().await?;
                }
                _ = send_sleep, if send_deadline.is_some() => {
                    self.fire_send().await?;
                    send_deadline = self.next_send_deadline();
                }
                _ = ticker_keepalive.tick() => {
                    self.send_keepalive().await;
                }
                _ = ticker_status.tick() => {
                    self.send_status().await;
                }
            }
        }
    }

    async fn handle_downlink(&mut self, packet: crate::model::TxPacket) -> Result<(), CoreError> {
        if packet.immediate {
            self.transmit(packet).await?;
        } else if !self.queue.insert(packet) {
            warn!(cap = MAX_QUEUE_LEN, "tx queue full, dropping newest downlink");
        }
        Ok(())
    }

    fn next_send_deadline(&self) -> Option<Instant> {
        self.queue.peek_count_us().map(|count_us| {
            let target = self.base_time + Duration::from_micros(count_us as u64);
            if target < Instant::now() {
                warn!(count_us, "scheduled downlink is already past due, sending at next tick");
            }
            target
        })
    }

    async fn fire_send(&mut self) -> Result<(), CoreError> {
        if let Some(packet) = self.queue.pop() {
            self.transmit(packet).await?;
        }
        Ok(())
    }

    /// Hands a packet to the radio and re-arms receive afterward (§4.3:
    /// "the core considers the radio idle and re-arms after"; §4.6: "send
    /// now and re-arm receive"). Re-arming happens whether `send` succeeded
    /// or failed — a failed send still leaves the radio idle.
    async fn transmit(&mut self, mut packet: crate::model::TxPacket) -> Result<(), CoreError> {
        if !packet.immediate {
            packet.power_dbm = packet.power_dbm.min(SCHEDULED_POWER_CAP_DBM);
        }
        if let Some(mtype) = mhdr::decode_mhdr(&packet.data) {
            debug!(?mtype, freq_hz = packet.freq_hz, "transmitting downlink");
        }
        match self.radio.send(&packet).await {
            Ok(()) => self.stats.record_tx(),
            Err(error) => warn!(%error, "radio send failed, downlink dropped"),
        }
        self.radio
            .start_receive(self.radio_config)
            .await
            .map_err(CoreError::RadioBringUp)
    }

    async fn poll_and_forward(&mut self) -> Result<(), CoreError> {
        let mut batch = self
            .radio
            .poll_received()
            .await
            .map_err(CoreError::RadioRuntime)?;
        if batch.is_empty() {
            return Ok(());
        }

        let now_us = (Instant::now() - self.base_time).as_micros() as u32;
        let mut crc_ok = 0u64;
        let rxpk: Vec<RxPk> = batch
            .iter_mut()
            .map(|packet| {
                packet.count_us = now_us;
                if packet.stat_crc == CrcStatus::Ok {
                    crc_ok += 1;
                }
                if let Some(mtype) = mhdr::decode_mhdr(&packet.data) {
                    debug!(?mtype, freq_hz = packet.freq_hz, "received uplink");
                }
                packet.to_wire()
            })
            .collect();

        self.stats.record_rx_batch(batch.len() as u64, crc_ok);
        self.stats.record_forwarded(batch.len() as u64);

        let push: Packet = push_data::Packet::from_rxpk(self.gateway_id, rxpk).into();
        upstream::send_to_all(&self.socket, &self.servers, &push).await;
        self.stats.record_upstream_sent();

        self.radio
            .start_receive(self.radio_config)
            .await
            .map_err(CoreError::RadioBringUp)
    }

    async fn send_keepalive(&mut self) {
        let pull_data: Packet = pull_data::Packet {
            random_token: rand::random(),
            gateway_id: self.gateway_id,
        }
        .into();
        upstream::send_to_all(&self.socket, &self.servers, &pull_data).await;
        self.stats.record_upstream_sent();
    }

    async fn send_status(&mut self) {
        let stat = self.stats.snapshot_and_reset();
        let push: Packet = push_data::Packet::from_stat(self.gateway_id, stat).into();
        upstream::send_to_all(&self.socket, &self.servers, &push).await;
        self.stats.record_upstream_sent();
    }
}
