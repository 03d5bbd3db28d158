//! Where the sender key is loaded from.

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::wallet::{SenderWallet, DEFAULT_KEY_ENV};

/// Location of the sender key.
#[derive(Clone)]
pub enum KeySource {
    /// Hex private key in an environment variable.
    Env { var: String },
    /// Encrypted JSON keystore.
    Keystore { path: PathBuf, password: String },
}

impl Default for KeySource {
    fn default() -> Self {
        Self::Env {
            var: DEFAULT_KEY_ENV.to_string(),
        }
    }
}

impl KeySource {
    pub fn env(var: impl Into<String>) -> Self {
        Self::Env { var: var.into() }
    }

    pub fn keystore(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self::Keystore {
            path: path.into(),
            password: password.into(),
        }
    }

    /// Load the wallet. Each call reads the key afresh.
    pub fn load(&self) -> Result<SenderWallet> {
        let wallet = match self {
            Self::Env { var } => SenderWallet::from_env_var(var)?,
            Self::Keystore { path, password } => SenderWallet::from_keystore(path, password)?,
        };

        debug!(address = %wallet.address(), source = ?self, "Loaded sender wallet");
        Ok(wallet)
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env { var } => f.debug_struct("Env").field("var", var).finish(),
            Self::Keystore { path, .. } => f
                .debug_struct("Keystore")
                .field("path", path)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source() {
        match KeySource::default() {
            KeySource::Env { var } => assert_eq!(var, "SIGNER_PRIVATE_KEY"),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let source = KeySource::keystore("/tmp/key.json", "hunter2");
        let debug_str = format!("{:?}", source);

        assert!(debug_str.contains("key.json"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_load_missing_keystore() {
        let dir = tempfile::tempdir().unwrap();
        let source = KeySource::keystore(dir.path().join("absent.json"), "password");
        assert!(source.load().is_err());
    }
}
