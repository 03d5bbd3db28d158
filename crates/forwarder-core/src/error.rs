//! Error types for the forward-request signing pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Signing error: {message}")]
    Signing { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// An error returned by the node or the forwarder, carried verbatim.
    #[error("RPC error: {message}")]
    Rpc { message: String, code: Option<i64> },
}

impl Error {
    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        Error::Encoding {
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn signing(message: impl Into<String>) -> Self {
        Error::Signing {
            message: message.into(),
        }
    }

    pub(crate) fn export(message: impl Into<String>) -> Self {
        Error::Export {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
