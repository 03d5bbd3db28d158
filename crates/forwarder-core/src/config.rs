//! Configuration management for the forward-request signer.
//!
//! The forwarder's chain id and address are required everywhere they are
//! read; there is no fallback deployment.

use crate::export::DEFAULT_ARTIFACT_PATH;
use crate::signing::{SigningDomain, DEFAULT_GAS_LIMIT, FORWARDER_DOMAIN_NAME, FORWARDER_DOMAIN_VERSION};
use crate::{Error, Result};
use alloy_primitives::{Address, U256};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides of file-based configuration,
/// e.g. `GASLESS__FORWARDER__CHAIN_ID`.
pub const ENV_PREFIX: &str = "GASLESS";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc_url: Option<String>,
    pub forwarder: ForwarderConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// The forwarder deployment that verifies signatures.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwarderConfig {
    pub chain_id: u64,
    pub address: Address,
    #[serde(default = "default_domain_name")]
    pub name: String,
    #[serde(default = "default_domain_version")]
    pub version: String,
}

/// The contract the forwarded call is dispatched to.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub contract: Address,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_artifact_path")]
    pub path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_artifact_path(),
        }
    }
}

fn default_domain_name() -> String {
    FORWARDER_DOMAIN_NAME.to_string()
}

fn default_domain_version() -> String {
    FORWARDER_DOMAIN_VERSION.to_string()
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_PATH)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from a variable lookup.
    ///
    /// Reads `FORWARDER_CHAIN_ID`, `FORWARDER_ADDRESS` and
    /// `MEMBERSHIP_CONTRACT` (required), and `RPC_URL`, `FORWARDER_NAME`,
    /// `FORWARDER_VERSION`, `META_TX_GAS_LIMIT`, `SIGNED_REQUEST_PATH`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| Error::Configuration {
                message: format!("{} environment variable not set", name),
            })
        };

        let chain_id = required("FORWARDER_CHAIN_ID")?;
        let chain_id = chain_id.trim().parse::<u64>().map_err(|e| Error::Configuration {
            message: format!("FORWARDER_CHAIN_ID `{}` is not a chain id: {}", chain_id, e),
        })?;

        let gas_limit = match lookup("META_TX_GAS_LIMIT") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| Error::Configuration {
                message: format!("META_TX_GAS_LIMIT `{}` is not a gas limit: {}", value, e),
            })?,
            None => DEFAULT_GAS_LIMIT,
        };

        let config = Self {
            rpc_url: lookup("RPC_URL"),
            forwarder: ForwarderConfig {
                chain_id,
                address: parse_address("FORWARDER_ADDRESS", &required("FORWARDER_ADDRESS")?)?,
                name: lookup("FORWARDER_NAME").unwrap_or_else(default_domain_name),
                version: lookup("FORWARDER_VERSION").unwrap_or_else(default_domain_version),
            },
            target: TargetConfig {
                contract: parse_address("MEMBERSHIP_CONTRACT", &required("MEMBERSHIP_CONTRACT")?)?,
                gas_limit,
            },
            export: ExportConfig {
                path: lookup("SIGNED_REQUEST_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_artifact_path),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, with `GASLESS__*` environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject placeholder deployment values.
    pub fn validate(&self) -> Result<()> {
        if self.forwarder.chain_id == 0 {
            return Err(Error::Configuration {
                message: "forwarder chain id must be the deployment's chain id, not 0".to_string(),
            });
        }
        if self.forwarder.address == Address::ZERO {
            return Err(Error::Configuration {
                message: "forwarder address must be the deployed forwarder, not the zero address"
                    .to_string(),
            });
        }
        if self.target.contract == Address::ZERO {
            return Err(Error::Configuration {
                message: "target contract must not be the zero address".to_string(),
            });
        }
        if self.forwarder.name.is_empty() || self.forwarder.version.is_empty() {
            return Err(Error::Configuration {
                message: "forwarder domain name and version must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The signing domain for this deployment.
    pub fn domain(&self) -> SigningDomain {
        SigningDomain::custom(
            self.forwarder.name.clone(),
            self.forwarder.version.clone(),
            U256::from(self.forwarder.chain_id),
            self.forwarder.address,
        )
    }

    /// RPC URL, required by callers that read forwarder state.
    pub fn require_rpc_url(&self) -> Result<&str> {
        self.rpc_url.as_deref().ok_or_else(|| Error::Configuration {
            message: "RPC_URL environment variable not set".to_string(),
        })
    }

    /// Load configuration for testing (with defaults).
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            rpc_url: None,
            forwarder: ForwarderConfig {
                chain_id: 11_155_111,
                address: "0x497b11C99CB77920EFC63e4a5D7396B3709BcDB3"
                    .parse()
                    .unwrap(),
                name: default_domain_name(),
                version: default_domain_version(),
            },
            target: TargetConfig {
                contract: "0xAaf086EC89D311f3fcAB1B17A735d4c8D746DFcF"
                    .parse()
                    .unwrap(),
                gas_limit: DEFAULT_GAS_LIMIT,
            },
            export: ExportConfig::default(),
        }
    }
}

fn parse_address(name: &str, value: &str) -> Result<Address> {
    value.trim().parse().map_err(|e| Error::Configuration {
        message: format!("{} `{}` is not an address: {}", name, value, e),
    })
}
