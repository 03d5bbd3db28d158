//! Relayer-facing export of signed forward requests.
//!
//! The artifact layout is fixed:
//!
//! ```json
//! {
//!   "request": {
//!     "from": "0x...", "to": "0x...",
//!     "value": "<wei, decimal string>",
//!     "gas": 100000,
//!     "nonce": 0,
//!     "data": "0x<call payload>"
//!   },
//!   "signature": "0x<r ‖ s ‖ v>"
//! }
//! ```
//!
//! Keys are emitted in struct field order, so identical requests export to
//! identical bytes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use alloy_primitives::{Address, Signature, U256};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::encoding::CallPayload;
use crate::signing::{ForwardRequest, SignedRequest};
use crate::{Error, Result};

/// Default artifact file name.
pub const DEFAULT_ARTIFACT_PATH: &str = "signed_request.json";

/// The `request` object of an exported artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactRequest {
    /// Sender address, EIP-55 checksummed.
    pub from: String,
    /// Target address, EIP-55 checksummed.
    pub to: String,
    /// Value in wei as a decimal string.
    pub value: String,
    pub gas: u64,
    pub nonce: u64,
    /// Call payload as `0x` hex.
    pub data: String,
}

/// A signed forward request in its persisted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignedRequestArtifact {
    pub request: ArtifactRequest,
    /// 65-byte signature as `0x` hex.
    pub signature: String,
}

impl SignedRequestArtifact {
    /// Render a signed request. Fails if the nonce does not fit a JSON integer.
    pub fn from_signed(signed: &SignedRequest) -> Result<Self> {
        let request = signed.request();
        let nonce = request.nonce();
        if nonce > U256::from(u64::MAX) {
            return Err(Error::export(format!(
                "nonce {} does not fit the artifact's integer field",
                nonce
            )));
        }

        Ok(Self {
            request: ArtifactRequest {
                from: request.from().to_checksum(None),
                to: request.to().to_checksum(None),
                value: request.value().to_string(),
                gas: request.gas(),
                nonce: nonce.to::<u64>(),
                data: request.data().to_hex(),
            },
            signature: signed.signature_hex(),
        })
    }

    /// Pretty JSON (two-space indent) with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse the artifact back into a request and signature.
    pub fn into_parts(self) -> Result<(ForwardRequest, Signature)> {
        let from = parse_address("from", &self.request.from)?;
        let to = parse_address("to", &self.request.to)?;
        let value = U256::from_str_radix(&self.request.value, 10).map_err(|e| {
            Error::export(format!(
                "artifact value `{}` is not a decimal integer: {}",
                self.request.value,
                e
            ))
        })?;
        let data = CallPayload::from_hex(&self.request.data)?;

        let request = ForwardRequest::builder()
            .from(from)
            .to(to)
            .value(value)
            .gas(self.request.gas)
            .nonce(U256::from(self.request.nonce))
            .data(data)
            .build()?;

        let raw = hex::decode(self.signature.trim_start_matches("0x"))
            .map_err(|e| Error::export(format!("artifact signature is not hex: {}", e)))?;
        if raw.len() != 65 {
            return Err(Error::export(format!(
                "artifact signature must be 65 bytes, got {}",
                raw.len()
            )));
        }
        let signature = Signature::from_raw(&raw)
            .map_err(|e| Error::export(format!("artifact signature is malformed: {}", e)))?;

        Ok((request, signature))
    }
}

fn parse_address(field: &str, text: &str) -> Result<Address> {
    text.parse::<Address>()
        .map_err(|e| Error::export(format!("artifact `{}` is not an address: {}", field, e)))
}

/// Writes signed request artifacts to a single named location.
#[derive(Debug, Clone)]
pub struct RequestExporter {
    path: PathBuf,
}

impl RequestExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render and write `signed`, replacing any previous artifact.
    pub fn export(&self, signed: &SignedRequest) -> Result<SignedRequestArtifact> {
        let artifact = SignedRequestArtifact::from_signed(signed)?;
        self.write(&artifact)?;
        Ok(artifact)
    }

    /// Atomically replace the artifact file.
    ///
    /// The JSON goes to a temporary file in the target directory, is
    /// flushed to disk, then renamed over the target. Readers see either
    /// the old file or the complete new one.
    pub fn write(&self, artifact: &SignedRequestArtifact) -> Result<()> {
        let json = artifact.to_json_pretty()?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        fs::create_dir_all(dir).map_err(|e| self.io_error("create directory for", e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.io_error("stage", e))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| self.io_error("write", e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| self.io_error("flush", e))?;
        temp.persist(&self.path)
            .map_err(|e| self.io_error("replace", e.error))?;

        info!(
            path = %self.path.display(),
            sender = %artifact.request.from,
            nonce = artifact.request.nonce,
            "Exported signed forward request"
        );

        Ok(())
    }

    /// Read the artifact currently stored at the export path.
    pub fn load(&self) -> Result<SignedRequestArtifact> {
        let text = fs::read_to_string(&self.path).map_err(|e| self.io_error("read", e))?;
        SignedRequestArtifact::from_json(&text)
    }

    fn io_error(&self, action: &str, err: std::io::Error) -> Error {
        Error::export(format!("failed to {} {}: {}", action, self.path.display(), err))
    }
}
