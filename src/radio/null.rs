//! A radio adapter that talks to nothing. The SX127x register-level driver
//! is an external collaborator (§1 Non-goals); this stub satisfies
//! [`RadioAdapter`] so the gateway core can be bootstrapped, tested, and run
//! end-to-end without physical hardware attached.
use super::{RadioAdapter, RadioConfig, RadioError};
use crate::model::TxPacket;
use async_trait::async_trait;
use tracing::debug;

/// Never produces an RxPacket and never fails. Useful for bring-up and for
/// driving the event loop in integration tests where RX is injected some
/// other way (e.g. by feeding PULL_RESP datagrams over the loopback socket).
#[derive(Debug, Default)]
pub struct NullRadio {
    config: Option<RadioConfig>,
}

impl NullRadio {
    pub fn new() -> Self {
        NullRadio::default()
    }
}

#[async_trait]
impl RadioAdapter for NullRadio {
    async fn configure(&mut self, config: RadioConfig) -> Result<(), RadioError> {
        debug!(freq_hz = config.freq_hz, "null radio configured");
        self.config = Some(config);
        Ok(())
    }

    async fn start_receive(&mut self, config: RadioConfig) -> Result<(), RadioError> {
        self.config = Some(config);
        Ok(())
    }

    async fn poll_received(&mut self) -> Result<Vec<crate::model::RxPacket>, RadioError> {
        Ok(Vec::new())
    }

    async fn send(&mut self, packet: &TxPacket) -> Result<(), RadioError> {
        debug!(freq_hz = packet.freq_hz, len = packet.data.len(), "null radio discarding tx");
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{Bandwidth, CodingRate, Modulation, SpreadingFactor};

    fn config() -> RadioConfig {
        RadioConfig {
            freq_hz: 868_100_000,
            modulation: Modulation::LORA,
            bandwidth: Bandwidth::Bw125,
            coding_rate: CodingRate::Cr4_5,
            spreading_factor: SpreadingFactor::SF12,
            preamble_len: 8,
        }
    }

    #[tokio::test]
    async fn never_yields_rx_packets() {
        let mut radio = NullRadio::new();
        radio.configure(config()).await.unwrap();
        radio.start_receive(config()).await.unwrap();
        assert!(radio.poll_received().await.unwrap().is_empty());
    }
}
