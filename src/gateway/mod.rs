//! The gateway runtime: the event loop (§4.6) paired with the downstream
//! reader (§4.5), talking to the network server over a shared UDP socket
//! via the upstream emitter (§4.4).
pub mod core;
pub mod downstream;
pub mod upstream;

pub use core::{CoreError, GatewayCore};
pub use downstream::{DownstreamError, DownstreamEvent};

use crate::codec::GatewayId;
use anyhow::Result;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Runs the event loop and the downstream reader concurrently. There is no
/// clean shutdown path (§5): this returns only when one side hits a fatal
/// error, at which point the other is dropped.
pub async fn run(core: GatewayCore, socket: Arc<UdpSocket>, gateway_id: GatewayId) -> Result<()> {
    let (events_tx, events_rx) = mpsc::channel(1);
    let reader = tokio::spawn(downstream::run(socket, gateway_id, events_tx));

    tokio::select! {
        result = core.run(events_rx) => result.map_err(Into::into),
        joined = reader => match joined {
            Ok(result) => result.map_err(Into::into),
            Err(join_error) => Err(join_error.into()),
        },
    }
}
