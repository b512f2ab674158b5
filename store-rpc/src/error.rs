use rpc_transport::TransportError;
use thiserror::Error;

use crate::shape::Shape;

/// Errors surfaced by [`Client`](crate::Client) and option loading.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to connect to `{address}`: {source}")]
    Connection {
        address: String,
        #[source]
        source: TransportError,
    },
    #[error("call `{method}` failed: {source}")]
    Call {
        method: String,
        #[source]
        source: TransportError,
    },
    #[error("failed to close connection: {source}")]
    Close {
        #[source]
        source: TransportError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] serde_yaml_bw::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("unsupported options file format `{0}`")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RpcError {
    pub fn connection(address: impl Into<String>, source: TransportError) -> Self {
        Self::Connection {
            address: address.into(),
            source,
        }
    }

    pub fn call(method: impl Into<String>, source: TransportError) -> Self {
        Self::Call {
            method: method.into(),
            source,
        }
    }

    pub fn close(source: TransportError) -> Self {
        Self::Close { source }
    }
}

/// Failures of [`Outcome::convert_to`](crate::Outcome::convert_to).
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
    #[error("type mismatch: cannot convert {data} data into {destination} destination")]
    TypeMismatch { data: Shape, destination: Shape },
    #[error("conversion failed: {0}")]
    Conversion(#[source] serde_json::Error),
}
