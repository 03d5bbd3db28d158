//! Membership renewal pipeline.
//!
//! Reads the sender's forwarder nonce, encodes the renewal call, and
//! assembles and signs the forward request. Writing the artifact is left
//! to [`RequestExporter`](crate::export::RequestExporter).

use alloy_primitives::{Address, U256};
use alloy_signer_local::PrivateKeySigner;
use tracing::info;

use crate::api::NonceSource;
use crate::config::Config;
use crate::encoding::meta_renew_membership;
use crate::signing::{DigestSigner, ForwardRequest, SignedRequest, SigningDomain};
use crate::Result;

/// What the sender asks the membership contract to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalIntent {
    pub token_id: U256,
    pub duration_secs: U256,
    /// Renewal fee forwarded as `value`, in wei.
    pub fee_wei: U256,
}

impl RenewalIntent {
    pub fn new(token_id: U256, duration_secs: U256, fee_wei: U256) -> Self {
        Self {
            token_id,
            duration_secs,
            fee_wei,
        }
    }
}

/// Renewal request pipeline for one forwarder deployment and target contract.
#[derive(Debug, Clone)]
pub struct RenewalPipeline {
    signer: DigestSigner,
    target: Address,
    gas_limit: u64,
}

impl RenewalPipeline {
    pub fn new(domain: SigningDomain, target: Address, gas_limit: u64) -> Self {
        Self {
            signer: DigestSigner::new(domain),
            target,
            gas_limit,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.domain(), config.target.contract, config.target.gas_limit)
    }

    pub fn signer(&self) -> &DigestSigner {
        &self.signer
    }

    pub fn target(&self) -> Address {
        self.target
    }

    /// Build the unsigned renewal request for `from` at `nonce`.
    ///
    /// The renewed membership is credited to the sender.
    pub fn build_request(
        &self,
        from: Address,
        nonce: U256,
        intent: &RenewalIntent,
    ) -> Result<ForwardRequest> {
        let data = meta_renew_membership(intent.token_id, intent.duration_secs, from)?;

        ForwardRequest::builder()
            .from(from)
            .to(self.target)
            .value(intent.fee_wei)
            .gas(self.gas_limit)
            .nonce(nonce)
            .data(data)
            .build()
    }

    /// Read the forwarder nonce for `from` and build the renewal request.
    pub async fn prepare_renewal<N: NonceSource + ?Sized>(
        &self,
        nonces: &N,
        from: Address,
        intent: &RenewalIntent,
    ) -> Result<ForwardRequest> {
        let nonce = nonces.nonce(from).await?;
        let request = self.build_request(from, nonce, intent)?;

        info!(
            sender = %from,
            nonce = %nonce,
            target = %self.target,
            token_id = %intent.token_id,
            "Prepared renewal request"
        );

        Ok(request)
    }

    /// Sign a prepared request, consuming the key.
    pub fn sign(&self, request: &ForwardRequest, key: PrivateKeySigner) -> Result<SignedRequest> {
        let signed = self.signer.sign(request, key)?;

        info!(
            sender = %request.from(),
            nonce = %request.nonce(),
            digest = %signed.digest(),
            "Signed renewal request"
        );

        Ok(signed)
    }
}
