//! The narrow contract the gateway core uses to drive the physical radio.
//! The SX127x register-level driver is an external collaborator behind
//! this trait; the core never assumes anything about its internals beyond
//! what's written here.
use crate::codec::{Bandwidth, CodingRate, Modulation, SpreadingFactor};
use crate::model::RxPacket;
use async_trait::async_trait;
use thiserror::Error;

pub mod null;
pub use null::NullRadio;

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("radio bring-up failed: {0}")]
    BringUp(String),
    #[error("radio send failed: {0}")]
    Send(String),
}

#[derive(Debug, Clone, Copy)]
pub struct RadioConfig {
    pub freq_hz: u32,
    pub modulation: Modulation,
    pub bandwidth: Bandwidth,
    pub coding_rate: CodingRate,
    pub spreading_factor: SpreadingFactor,
    pub preamble_len: u16,
}

/// The core depends on this contract only. `configure`/`start_receive`
/// failures are treated as fatal by callers (the physical device is
/// unusable); `send` failures are logged and counted, the loop continues.
#[async_trait]
pub trait RadioAdapter: Send + Sync {
    async fn configure(&mut self, config: RadioConfig) -> Result<(), RadioError>;

    /// Arms receive on the configured channel. Idempotent.
    async fn start_receive(&mut self, config: RadioConfig) -> Result<(), RadioError>;

    /// Non-blocking: returns zero or more packets captured since the last
    /// call. After a non-empty return the radio is considered idle and
    /// requires a fresh `start_receive`.
    async fn poll_received(&mut self) -> Result<Vec<RxPacket>, RadioError>;

    /// Blocks until the packet has been handed to the air. The core
    /// considers the radio idle and re-arms receive afterward.
    async fn send(&mut self, packet: &crate::model::TxPacket) -> Result<(), RadioError>;

    fn name(&self) -> &str;
}
