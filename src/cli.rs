use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Single-channel LoRa packet forwarder.
#[derive(Debug, Parser)]
#[command(name = "single-chan-pkt-fwd", version)]
pub struct Cli {
    /// Log verbosity. `none` disables all logging.
    #[arg(short = 'l', long, value_enum, default_value_t = LogLevel::Normal)]
    pub log_level: LogLevel,

    /// Path to the gateway configuration file.
    #[arg(short = 'c', long, default_value = "global_conf.json")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Error,
    Warn,
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    /// `None` means "disable the subscriber entirely"; every other level
    /// maps onto a `tracing::Level`, matching the five-step ordering of
    /// the original `logLevelStr` table (error < warn < normal < verbose <
    /// debug).
    pub fn tracing_level(self) -> Option<tracing::Level> {
        match self {
            LogLevel::None => None,
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Normal => Some(tracing::Level::INFO),
            LogLevel::Verbose => Some(tracing::Level::DEBUG),
            LogLevel::Debug => Some(tracing::Level::TRACE),
        }
    }
}
