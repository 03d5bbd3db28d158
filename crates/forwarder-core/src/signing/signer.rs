//! Forward-request signing.
//!
//! Computes the EIP-712 digest of a [`ForwardRequest`] under a
//! [`SigningDomain`] and signs it with a recoverable secp256k1 signature.
//! Nonces are derived per RFC 6979, so the same inputs always produce the
//! same signature.

use alloy_primitives::{Address, Signature, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use serde_json::{json, Value};
use tracing::debug;

use super::domain::{SigningDomain, DOMAIN_TYPE_NAME};
use super::request::{ForwardRequest, FORWARD_REQUEST_TYPE_NAME};
use super::schema::TypedSchema;
use crate::{Error, Result};

/// Compute the EIP-712 typed data hash.
pub fn typed_data_digest(domain_separator: B256, struct_hash: B256) -> B256 {
    let mut data = Vec::with_capacity(2 + 32 + 32);
    data.extend_from_slice(&[0x19, 0x01]);
    data.extend_from_slice(domain_separator.as_slice());
    data.extend_from_slice(struct_hash.as_slice());
    alloy_primitives::keccak256(&data)
}

/// A forward request together with its signature and the digest it signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    request: ForwardRequest,
    signature: Signature,
    digest: B256,
}

impl SignedRequest {
    /// Reassemble a signed request, e.g. after loading an exported artifact.
    pub fn new(request: ForwardRequest, signature: Signature, digest: B256) -> Self {
        Self {
            request,
            signature,
            digest,
        }
    }

    pub fn request(&self) -> &ForwardRequest {
        &self.request
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn digest(&self) -> B256 {
        self.digest
    }

    /// `0x` + 130 hex chars (`r ‖ s ‖ v`, v in {27, 28}).
    pub fn signature_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signature.as_bytes()))
    }

    /// Address recovered from the signature over the stored digest.
    pub fn recover_signer(&self) -> Result<Address> {
        self.signature
            .recover_address_from_prehash(&self.digest)
            .map_err(|e| Error::signing(format!("failed to recover signer: {}", e)))
    }

    pub fn into_parts(self) -> (ForwardRequest, Signature) {
        (self.request, self.signature)
    }
}

/// Signs forward requests for one forwarder deployment.
///
/// Holds only the domain. Keys are passed per call and dropped before the
/// call returns.
#[derive(Debug, Clone)]
pub struct DigestSigner {
    domain: SigningDomain,
}

impl DigestSigner {
    pub fn new(domain: SigningDomain) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    /// EIP-712 digest of `request` under this signer's domain.
    pub fn digest(&self, request: &ForwardRequest) -> Result<B256> {
        self.digest_with_schemas(&SigningDomain::schema(), &ForwardRequest::schema(), request)
    }

    /// EIP-712 digest using explicit schemas for both structs.
    pub fn digest_with_schemas(
        &self,
        domain_schema: &TypedSchema,
        request_schema: &TypedSchema,
        request: &ForwardRequest,
    ) -> Result<B256> {
        let domain_separator = domain_schema.hash_struct(&self.domain.to_message())?;
        let struct_hash = request_schema.hash_struct(&request.to_message())?;
        Ok(typed_data_digest(domain_separator, struct_hash))
    }

    /// Sign a request, consuming the key.
    ///
    /// The key must belong to `request.from()`; the forwarder would reject
    /// anything else.
    pub fn sign(&self, request: &ForwardRequest, key: PrivateKeySigner) -> Result<SignedRequest> {
        if key.address() != request.from() {
            return Err(Error::signing(format!(
                "signing key address {} does not match request sender {}",
                key.address(),
                request.from()
            )));
        }

        let digest = self.digest(request)?;
        let signature = key
            .sign_hash_sync(&digest)
            .map_err(|e| Error::signing(format!("failed to sign forward request: {}", e)))?;
        drop(key);

        debug!(
            sender = %request.from(),
            nonce = %request.nonce(),
            digest = %digest,
            "Signed forward request"
        );

        Ok(SignedRequest {
            request: request.clone(),
            signature,
            digest,
        })
    }

    /// Sign a request with a raw 32-byte secp256k1 secret.
    pub fn sign_with_key_bytes(&self, request: &ForwardRequest, key: &[u8]) -> Result<SignedRequest> {
        let signer = PrivateKeySigner::from_slice(key)
            .map_err(|_| Error::signing("malformed private key: expected a 32-byte secp256k1 secret"))?;
        self.sign(request, signer)
    }

    /// Check that `signature` is `request.from()`'s signature under this domain.
    ///
    /// Mirrors the signature half of the forwarder's `verify`; nonce
    /// freshness is only known on-chain.
    pub fn verify(&self, request: &ForwardRequest, signature: &Signature) -> Result<bool> {
        let digest = self.digest(request)?;
        match signature.recover_address_from_prehash(&digest) {
            Ok(recovered) => Ok(recovered == request.from()),
            Err(_) => Ok(false),
        }
    }

    /// The request as `eth_signTypedData_v4` JSON, for wallets that sign
    /// typed data themselves.
    pub fn typed_data(&self, request: &ForwardRequest) -> Value {
        json!({
            "types": {
                DOMAIN_TYPE_NAME: SigningDomain::schema().fields(),
                FORWARD_REQUEST_TYPE_NAME: ForwardRequest::schema().fields(),
            },
            "domain": {
                "name": self.domain.name,
                "version": self.domain.version,
                "chainId": uint_json(self.domain.chain_id),
                "verifyingContract": self.domain.verifying_contract.to_checksum(None),
            },
            "primaryType": FORWARD_REQUEST_TYPE_NAME,
            "message": {
                "from": request.from().to_checksum(None),
                "to": request.to().to_checksum(None),
                "value": request.value().to_string(),
                "gas": request.gas(),
                "nonce": uint_json(request.nonce()),
                "data": request.data().to_hex(),
            },
        })
    }
}

/// JSON number when it fits in u64, decimal string otherwise.
fn uint_json(value: U256) -> Value {
    if value <= U256::from(u64::MAX) {
        Value::from(value.to::<u64>())
    } else {
        Value::String(value.to_string())
    }
}
