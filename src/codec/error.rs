use super::{Down, Identifier, Up};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("json serialization error")]
    JsonSerialize(#[from] serde_json::error::Error),
    #[error("packet parse error")]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid GWMP version")]
    InvalidProtocolVersion,
    #[error("frame truncated before identifier byte")]
    Truncated,
    #[error("invalid GWMP frame identifier")]
    InvalidIdentifier,
    #[error("utf8 error")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid JSON body for {identifier:?} frame: {json_str}. error: {json_error}")]
    InvalidJson {
        identifier: Identifier,
        json_str: String,
        json_error: serde_json::Error,
    },
    #[error("received a downlink frame when expecting an uplink")]
    UnexpectedDownlink(Down),
    #[error("received an uplink frame when expecting a downlink")]
    UnexpectedUplink(Box<Up>),
}
