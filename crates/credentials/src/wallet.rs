//! Sender wallet for forward-request signing.
//!
//! Loads the sender key from an environment variable, a hex string or an
//! encrypted keystore. The key is handed to the signer by value and is
//! never printed.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;

/// Default environment variable holding the sender's private key.
pub const DEFAULT_KEY_ENV: &str = "SIGNER_PRIVATE_KEY";

/// The meta-transaction sender's wallet.
pub struct SenderWallet {
    signer: PrivateKeySigner,
    address: Address,
}

impl SenderWallet {
    /// Load wallet from the `SIGNER_PRIVATE_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_env_var(DEFAULT_KEY_ENV)
    }

    /// Load wallet from the named environment variable.
    ///
    /// The private key should be a 64-character hex string, optionally
    /// prefixed with "0x".
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set or
    /// if the private key format is invalid.
    pub fn from_env_var(name: &str) -> Result<Self> {
        dotenvy::dotenv().ok();
        let private_key = std::env::var(name)
            .with_context(|| format!("{} environment variable not set", name))?;

        Self::from_private_key(&private_key)
    }

    /// Create a wallet from a hex-encoded private key.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let key_clean = key.trim().trim_start_matches("0x");

        let signer = PrivateKeySigner::from_str(key_clean)
            .context("Invalid private key format - expected 64 hex characters")?;

        Ok(Self::from_signer(signer))
    }

    /// Decrypt a JSON keystore file.
    pub fn from_keystore(path: impl AsRef<Path>, password: &str) -> Result<Self> {
        let path = path.as_ref();
        let signer = PrivateKeySigner::decrypt_keystore(path, password)
            .with_context(|| format!("Failed to decrypt keystore {}", path.display()))?;

        Ok(Self::from_signer(signer))
    }

    fn from_signer(signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self { signer, address }
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Consume the wallet and return the signer.
    pub fn into_signer(self) -> PrivateKeySigner {
        self.signer
    }
}

impl std::fmt::Debug for SenderWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderWallet")
            .field("address", &self.address.to_string())
            .finish()
    }
}
