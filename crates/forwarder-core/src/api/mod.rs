//! API clients for external services.

pub mod forwarder;

pub use forwarder::{ForwarderClient, NonceSource};
