//! `global_conf.json` schema and loader. Missing `SX127X_conf` or
//! `gateway_conf` sections are fatal at startup, never a panic.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

fn default_bandwidth_hz() -> u32 {
    125_000
}

fn default_coderate() -> String {
    "4/5".to_string()
}

fn default_keepalive_interval() -> u64 {
    60
}

fn default_status_report_interval() -> u64 {
    240
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sx127xConf {
    pub freq: u32,
    pub modulation: String,
    #[serde(default = "default_bandwidth_hz")]
    pub bandwidth: u32,
    #[serde(default = "default_coderate")]
    pub coderate: String,
    pub spread_factor: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConf {
    pub server_address: String,
    pub serv_port_up: u16,
    pub serv_port_down: u16,
    pub serv_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConf {
    #[serde(rename = "gateway_ID")]
    pub gateway_id: GatewayIdField,
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
    #[serde(rename = "statusReport_interval", default = "default_status_report_interval")]
    pub status_report_interval: u64,
    #[serde(rename = "long")]
    pub longitude: Option<f64>,
    #[serde(rename = "lati")]
    pub latitude: Option<f64>,
    #[serde(rename = "alti")]
    pub altitude: Option<i64>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub mail: Option<String>,
    pub servers: Vec<ServerConf>,
}

/// Transparent wrapper so serde picks up the `gateway_ID` JSON key while
/// the Rust field stays snake_case.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct GatewayIdField(pub String);

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    #[serde(rename = "SX127X_conf")]
    pub sx127x_conf: Sx127xConf,
    #[serde(rename = "gateway_conf")]
    pub gateway_conf: GatewayConf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("gateway_ID {0:?} is not 16 hex characters")]
    InvalidGatewayId(String),
}

impl GlobalConfig {
    pub fn load(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let json = r#"{
            "SX127X_conf": { "freq": 868100000, "modulation": "LORA", "spread_factor": 12 },
            "gateway_conf": {
                "gateway_ID": "AA555A0000000000",
                "long": 2.3, "lati": 48.8, "alti": 35,
                "desc": "test gw", "mail": "ops@example.com",
                "servers": [ { "server_address": "router.example.com", "serv_port_up": 1700, "serv_port_down": 1700, "serv_enabled": true } ]
            }
        }"#;
        let config: GlobalConfig = serde_json::from_str(json).expect("parse config");
        assert_eq!(config.sx127x_conf.bandwidth, 125_000);
        assert_eq!(config.sx127x_conf.coderate, "4/5");
        assert_eq!(config.gateway_conf.keepalive_interval, 60);
        assert_eq!(config.gateway_conf.status_report_interval, 240);
        assert_eq!(config.gateway_conf.gateway_id.0, "AA555A0000000000");
    }

    #[test]
    fn parses_explicit_intervals() {
        let json = r#"{
            "SX127X_conf": { "freq": 868100000, "modulation": "LORA", "spread_factor": 12 },
            "gateway_conf": {
                "gateway_ID": "AA555A0000000000",
                "keepalive_interval": 30,
                "statusReport_interval": 120,
                "servers": []
            }
        }"#;
        let config: GlobalConfig = serde_json::from_str(json).expect("parse config");
        assert_eq!(config.gateway_conf.keepalive_interval, 30);
        assert_eq!(config.gateway_conf.status_report_interval, 120);
    }

    #[test]
    fn missing_gateway_conf_fails_to_parse() {
        let json = r#"{ "SX127X_conf": { "freq": 868100000, "modulation": "LORA", "spread_factor": 12 } }"#;
        assert!(serde_json::from_str::<GlobalConfig>(json).is_err());
    }
}
