//! Signing module for MinimalForwarder meta-transactions.
//!
//! This module provides EIP-712 typed data hashing and signing of
//! `ForwardRequest`s that a relayer later submits through the forwarder.
//!
//! # Architecture
//!
//! ```text
//! CallPayload (encoding)
//!       │
//!       ▼
//! ForwardRequestBuilder ◄── nonce (ForwarderClient::get_nonce)
//!       │
//!       ▼
//! DigestSigner ─── signs ──► SignedRequest
//!       ▲                        │
//!       │                        ▼
//! SigningDomain           RequestExporter ──► signed_request.json ──► relayer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use forwarder_core::signing::{DigestSigner, ForwardRequest, SigningDomain};
//! use forwarder_core::encoding::meta_renew_membership;
//!
//! let domain = SigningDomain::minimal_forwarder(11_155_111, forwarder_address);
//! let signer = DigestSigner::new(domain);
//!
//! let request = ForwardRequest::builder()
//!     .from(key.address())
//!     .to(membership_contract)
//!     .value(fee_wei)
//!     .gas(100_000)
//!     .nonce(client.get_nonce(key.address()).await?)
//!     .data(meta_renew_membership(token_id, duration, key.address())?)
//!     .build()?;
//!
//! let signed = signer.sign(&request, key)?;
//! ```

pub mod domain;
pub mod request;
pub mod schema;
pub mod signer;

pub use domain::{SigningDomain, FORWARDER_DOMAIN_NAME, FORWARDER_DOMAIN_VERSION};
pub use request::{ForwardRequest, ForwardRequestBuilder, DEFAULT_GAS_LIMIT};
pub use schema::{FieldType, SchemaField, TypedMessage, TypedSchema, TypedValue};
pub use signer::{typed_data_digest, DigestSigner, SignedRequest};
