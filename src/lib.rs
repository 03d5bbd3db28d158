//! Gasless membership renewal.
//!
//! This is the root crate that ties the workspace together and hosts the
//! end-to-end tests and benchmarks:
//!
//! - `forwarder-core`: call encoding, EIP-712 signing, export, forwarder RPC
//! - `credentials`: sender key loading

pub use credentials;
pub use forwarder_core as core;

use anyhow::Context;
use credentials::KeySource;
use forwarder_core::api::NonceSource;
use forwarder_core::config::Config;
use forwarder_core::export::{RequestExporter, SignedRequestArtifact};
use forwarder_core::pipeline::{RenewalIntent, RenewalPipeline};
use tracing::info;

/// Produce the signed renewal artifact for the sender held by `keys`.
///
/// The nonce is read before the key is loaded, and the key is consumed by
/// the signer. The artifact is written to the configured export path.
///
/// `keys` is loaded twice: once for the sender address before the nonce
/// read, and once for the signing key afterwards. A keystore source is
/// therefore decrypted twice, and the source must yield the same key both
/// times. If it does not, signing fails because the key no longer matches
/// the request's `from`.
pub async fn sign_renewal<N: NonceSource + ?Sized>(
    config: &Config,
    nonces: &N,
    keys: &KeySource,
    intent: &RenewalIntent,
) -> anyhow::Result<SignedRequestArtifact> {
    let pipeline = RenewalPipeline::from_config(config);

    // Only the address survives this load; no key is held across the nonce read.
    let from = keys.load().context("Failed to load sender key")?.address();
    let request = pipeline
        .prepare_renewal(nonces, from, intent)
        .await
        .context("Failed to prepare renewal request")?;

    let wallet = keys.load().context("Failed to load sender key")?;
    let signed = pipeline
        .sign(&request, wallet.into_signer())
        .context("Failed to sign renewal request")?;

    let exporter = RequestExporter::new(config.export.path.clone());
    let artifact = exporter
        .export(&signed)
        .context("Failed to export signed request")?;

    info!(path = %exporter.path().display(), sender = %from, "Renewal request ready for relayer");
    Ok(artifact)
}
