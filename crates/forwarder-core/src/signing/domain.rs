//! EIP-712 signing domain for MinimalForwarder deployments.
//!
//! The forwarder hashes its own `(name, version, chainid, address(this))`
//! when it verifies a request, so a domain built here must carry the real
//! chain id and forwarder address of the deployment. Neither has a default.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::schema::{FieldType, TypedMessage, TypedSchema, TypedValue};
use crate::Result;

/// Domain name the MinimalForwarder contract signs under.
pub const FORWARDER_DOMAIN_NAME: &str = "MinimalForwarder";

/// Domain version the MinimalForwarder contract signs under.
pub const FORWARDER_DOMAIN_VERSION: &str = "1";

/// Struct type name of the domain.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// EIP-712 domain scoping a signature to one forwarder deployment.
///
/// Serializes with the EIP-712 member names (`chainId`,
/// `verifyingContract`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningDomain {
    /// Domain name.
    pub name: String,
    /// Domain version.
    pub version: String,
    /// Chain ID.
    pub chain_id: U256,
    /// Verifying contract address (the forwarder).
    pub verifying_contract: Address,
}

impl SigningDomain {
    /// Domain of a MinimalForwarder deployed at `verifying_contract` on `chain_id`.
    pub fn minimal_forwarder(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: FORWARDER_DOMAIN_NAME.to_string(),
            version: FORWARDER_DOMAIN_VERSION.to_string(),
            chain_id: U256::from(chain_id),
            verifying_contract,
        }
    }

    /// Create domain with custom parameters.
    pub fn custom(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: U256,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// The `EIP712Domain` type in its fixed member order.
    pub fn schema() -> TypedSchema {
        TypedSchema::new(
            DOMAIN_TYPE_NAME,
            [
                ("name", FieldType::String),
                ("version", FieldType::String),
                ("chainId", FieldType::Uint256),
                ("verifyingContract", FieldType::Address),
            ],
        )
    }

    pub fn to_message(&self) -> TypedMessage {
        TypedMessage::from([
            ("name".to_string(), TypedValue::String(self.name.clone())),
            ("version".to_string(), TypedValue::String(self.version.clone())),
            ("chainId".to_string(), TypedValue::Uint(self.chain_id)),
            (
                "verifyingContract".to_string(),
                TypedValue::Address(self.verifying_contract),
            ),
        ])
    }

    /// Compute the EIP-712 domain separator hash.
    pub fn separator(&self) -> Result<B256> {
        Self::schema().hash_struct(&self.to_message())
    }
}
