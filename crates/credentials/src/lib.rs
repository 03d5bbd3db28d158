//! Sender Credentials
//!
//! Loading of the meta-transaction sender's signing key.

pub mod source;
pub mod wallet;

pub use source::KeySource;
pub use wallet::{SenderWallet, DEFAULT_KEY_ENV};
