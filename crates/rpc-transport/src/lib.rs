//! Blocking request/response transport used to reach a store RPC backend.
//!
//! A [`Connection`] is dialed once and then carries one call at a time; the
//! calling thread blocks until the matching response arrives.

pub mod codec;
mod config;
mod connection;
mod error;

pub use config::{CodecKind, Network};
pub use connection::Connection;
pub use error::TransportError;

use serde_json::Value;

/// Synchronous `call`/`close` contract the store client is written against.
pub trait Transport: Send {
    /// Invoke `method` with `params` and wait for its result.
    fn call(&mut self, method: &str, params: &Value) -> Result<Value, TransportError>;

    /// Release the underlying connection. Closing twice is not an error.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Dial `address` and return a boxed [`Transport`].
pub fn dial(
    network: Network,
    address: &str,
    codec: CodecKind,
) -> Result<Box<dyn Transport>, TransportError> {
    Ok(Box::new(Connection::dial(network, address, codec)?))
}
