use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to dial `{address}`: {source}")]
    Dial {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error on connection: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("malformed frame: {0}")]
    Frame(String),
    #[error("remote error: {0}")]
    Remote(String),
    #[error("response sequence mismatch: expected {expected}, got {actual}")]
    SequenceMismatch { expected: u64, actual: u64 },
    #[error("connection is closed")]
    Closed,
}

impl TransportError {
    pub fn dial(address: impl Into<String>, source: io::Error) -> Self {
        Self::Dial {
            address: address.into(),
            source,
        }
    }
}
