//! Shared tenant data types for the store RPC workspace.

pub mod store;

pub use store::{Configuration, Environment, Store};
