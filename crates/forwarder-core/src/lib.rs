//! Forwarder Core Library
//!
//! Call encoding, EIP-712 typed-data signing and export of MinimalForwarder
//! meta-transaction requests.

pub mod api;
pub mod config;
pub mod encoding;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod signing;

pub use error::{Error, Result};
