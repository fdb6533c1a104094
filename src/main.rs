//! §4.8 CLI & bootstrap: parse arguments, initialize logging, load and
//! validate `global_conf.json`, resolve servers, bind the UDP socket, and
//! hand off into the event loop. Fatal errors bubble to `main` through
//! `anyhow` and set a non-zero exit code; nothing past this module panics.
use anyhow::{bail, Context, Result};
use clap::Parser;
use lora_pktfwd::cli::Cli;
use lora_pktfwd::codec::{Bandwidth, CodingRate, GatewayId, Modulation, SpreadingFactor};
use lora_pktfwd::config::GlobalConfig;
use lora_pktfwd::gateway::{self, GatewayCore};
use lora_pktfwd::radio::{NullRadio, RadioConfig};
use lora_pktfwd::stats::{GatewayLocation, Statistics};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(error) = run(cli).await {
        tracing::error!(%error, "gateway exited with a fatal error");
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(cli: &Cli) {
    let Some(level) = cli.log_level.tracing_level() else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = GlobalConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let gateway_id = GatewayId::from_hex(&config.gateway_conf.gateway_id.0)
        .with_context(|| format!("gateway_ID {:?} is not 16 hex characters", config.gateway_conf.gateway_id.0))?;
    info!(%gateway_id, "starting gateway");

    let servers = resolve_servers(&config).await;
    if servers.is_empty() {
        bail!("no enabled server resolved to a usable address");
    }

    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .context("binding upstream/downstream UDP socket")?;
    let socket = Arc::new(socket);

    let radio_config = radio_config_from(&config)?;
    let location = GatewayLocation {
        latitude: config.gateway_conf.latitude,
        longitude: config.gateway_conf.longitude,
        altitude_m: config.gateway_conf.altitude,
        description: config.gateway_conf.description.clone(),
        mail: config.gateway_conf.mail.clone(),
    };

    let core = GatewayCore::new(
        gateway_id,
        servers,
        Arc::clone(&socket),
        Box::new(NullRadio::new()),
        radio_config,
        Statistics::new(location),
        Duration::from_secs(config.gateway_conf.keepalive_interval),
        Duration::from_secs(config.gateway_conf.status_report_interval),
    );

    gateway::run(core, socket, gateway_id).await
}

/// Resolves every enabled server's `(host, port_up)` to a `SocketAddr`,
/// logging and skipping any that fail DNS resolution (§6), rather than
/// treating a single bad hostname as fatal for the whole gateway.
async fn resolve_servers(config: &GlobalConfig) -> Vec<SocketAddr> {
    let mut resolved = Vec::new();
    for server in &config.gateway_conf.servers {
        if !server.serv_enabled {
            continue;
        }
        let hostport = format!("{}:{}", server.server_address, server.serv_port_up);
        match tokio::net::lookup_host(&hostport).await {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => {
                    info!(server = %hostport, %addr, "resolved upstream server");
                    resolved.push(addr);
                }
                None => warn!(server = %hostport, "no addresses returned for server, skipping"),
            },
            Err(error) => warn!(server = %hostport, %error, "failed to resolve server, skipping"),
        }
    }
    resolved
}

fn radio_config_from(config: &GlobalConfig) -> Result<RadioConfig> {
    let sx = &config.sx127x_conf;
    let modulation = match sx.modulation.as_str() {
        "LORA" => Modulation::LORA,
        "FSK" => Modulation::FSK,
        other => bail!("unsupported modulation {other:?} in SX127X_conf"),
    };
    let bandwidth = Bandwidth::from_hz(sx.bandwidth)
        .with_context(|| format!("unsupported bandwidth {} Hz in SX127X_conf", sx.bandwidth))?;
    let coding_rate = CodingRate::from_token(&sx.coderate)
        .with_context(|| format!("unsupported coderate {:?} in SX127X_conf", sx.coderate))?;
    let spreading_factor = SpreadingFactor::try_from(sx.spread_factor)
        .map_err(|_| anyhow::anyhow!("unsupported spread_factor {} in SX127X_conf", sx.spread_factor))?;

    Ok(RadioConfig {
        freq_hz: sx.freq,
        modulation,
        bandwidth,
        coding_rate,
        spreading_factor,
        preamble_len: 8,
    })
}
