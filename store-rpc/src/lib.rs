//! Batched multi-store RPC client with partial-failure replies and masked audit logging.

pub mod args;
pub mod client;
pub mod config;
pub mod error;
pub mod mask;
pub mod options;
pub mod outcome;
pub mod pager;
pub mod reply;
pub mod shape;

pub use args::{Args, Payload};
pub use client::Client;
pub use config::{OptionsFormat, load_options};
pub use error::{ConvertError, RpcError};
pub use options::{LogLevel, Options};
pub use outcome::Outcome;
pub use pager::Pager;
pub use reply::{Reply, ReplyError, TenantError};
pub use shape::Shape;

pub use rpc_transport::{CodecKind, Network, Transport, TransportError};
pub use store_types::{Configuration, Environment, Store};

/// Connect, issue a single call, and close again.
///
/// A close failure after a successful call is logged by the client and does
/// not discard the reply.
pub fn call_once(
    address: &str,
    options: Option<&Options>,
    method: &str,
    args: &Args,
) -> Result<Reply, RpcError> {
    let mut client = Client::connect(address, options)?;
    let mut reply = Reply::new();
    let result = client.call(method, args, &mut reply);
    let _ = client.close();
    result.map(|()| reply)
}
