//! Forward requests for MinimalForwarder signing.
//!
//! Defines the `ForwardRequest` struct the forwarder verifies and a
//! builder that refuses to produce an incomplete request.

use alloy_primitives::{Address, Bytes, B256, U256};

use super::schema::{FieldType, TypedMessage, TypedSchema, TypedValue};
use crate::encoding::CallPayload;
use crate::{Error, Result};

/// Struct type name of the forward request.
pub const FORWARD_REQUEST_TYPE_NAME: &str = "ForwardRequest";

/// Default gas limit forwarded with a renewal call.
pub const DEFAULT_GAS_LIMIT: u64 = 100_000;

/// One authorized, not-yet-broadcast call through the forwarder.
///
/// Matches `MinimalForwarder.ForwardRequest`. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    from: Address,
    to: Address,
    value: U256,
    gas: u64,
    nonce: U256,
    data: CallPayload,
}

impl ForwardRequest {
    pub fn builder() -> ForwardRequestBuilder {
        ForwardRequestBuilder::new()
    }

    /// Signer and sender the forwarder appends to the call.
    pub fn from(&self) -> Address {
        self.from
    }

    /// Target contract.
    pub fn to(&self) -> Address {
        self.to
    }

    /// Wei forwarded with the call.
    pub fn value(&self) -> U256 {
        self.value
    }

    /// Gas limit for the inner call.
    pub fn gas(&self) -> u64 {
        self.gas
    }

    /// Forwarder nonce of `from` at build time.
    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn data(&self) -> &CallPayload {
        &self.data
    }

    /// The `ForwardRequest` type in its fixed member order.
    pub fn schema() -> TypedSchema {
        TypedSchema::new(
            FORWARD_REQUEST_TYPE_NAME,
            [
                ("from", FieldType::Address),
                ("to", FieldType::Address),
                ("value", FieldType::Uint256),
                ("gas", FieldType::Uint256),
                ("nonce", FieldType::Uint256),
                ("data", FieldType::Bytes),
            ],
        )
    }

    pub fn to_message(&self) -> TypedMessage {
        TypedMessage::from([
            ("from".to_string(), TypedValue::Address(self.from)),
            ("to".to_string(), TypedValue::Address(self.to)),
            ("value".to_string(), TypedValue::Uint(self.value)),
            ("gas".to_string(), TypedValue::Uint(U256::from(self.gas))),
            ("nonce".to_string(), TypedValue::Uint(self.nonce)),
            (
                "data".to_string(),
                TypedValue::Bytes(self.data.as_bytes().clone()),
            ),
        ])
    }

    /// Compute the EIP-712 struct hash for this request.
    pub fn struct_hash(&self) -> Result<B256> {
        Self::schema().hash_struct(&self.to_message())
    }
}

/// Builder for [`ForwardRequest`].
///
/// The nonce has no default: it must come from the forwarder's
/// `getNonce(from)` read made just before building.
#[derive(Debug, Clone, Default)]
pub struct ForwardRequestBuilder {
    from: Option<Address>,
    to: Option<Address>,
    value: U256,
    gas: Option<u64>,
    nonce: Option<U256>,
    data: Option<CallPayload>,
}

impl ForwardRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender (the signing account).
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the target contract address.
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Set the forwarded value in wei.
    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set the gas limit.
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Set the forwarder nonce.
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the call payload.
    pub fn data(mut self, data: CallPayload) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the call payload from raw calldata, validating its shape.
    pub fn try_data(self, data: impl Into<Bytes>) -> Result<Self> {
        Ok(self.data(CallPayload::from_bytes(data)?))
    }

    /// Build the request.
    pub fn build(self) -> Result<ForwardRequest> {
        let from = self
            .from
            .ok_or_else(|| Error::configuration("forward request sender (`from`) is not set"))?;

        let to = self
            .to
            .ok_or_else(|| Error::configuration("forward request target (`to`) is not set"))?;
        if to == Address::ZERO {
            return Err(Error::configuration(
                "forward request target (`to`) must not be the zero address",
            ));
        }

        let gas = self
            .gas
            .ok_or_else(|| Error::configuration("forward request gas limit is not set"))?;

        let nonce = self.nonce.ok_or_else(|| {
            Error::configuration("forward request nonce is not set; read it from the forwarder")
        })?;

        let data = self
            .data
            .ok_or_else(|| Error::encoding("forward request call payload is not set"))?;

        Ok(ForwardRequest {
            from,
            to,
            value: self.value,
            gas,
            nonce,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::meta_renew_membership;

    const SENDER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const MEMBERSHIP: &str = "0xAaf086EC89D311f3fcAB1B17A735d4c8D746DFcF";

    fn sender() -> Address {
        SENDER.parse().unwrap()
    }

    fn payload() -> CallPayload {
        meta_renew_membership(U256::from(1u64), U256::from(2_592_000u64), sender()).unwrap()
    }

    fn complete_builder() -> ForwardRequestBuilder {
        ForwardRequest::builder()
            .from(sender())
            .to(MEMBERSHIP.parse().unwrap())
            .value(U256::from(10_000_000_000_000_000u64))
            .gas(DEFAULT_GAS_LIMIT)
            .nonce(U256::ZERO)
            .data(payload())
    }

    #[test]
    fn test_build_request() {
        let request = complete_builder().build().unwrap();

        assert_eq!(request.from(), sender());
        assert_eq!(request.to(), MEMBERSHIP.parse::<Address>().unwrap());
        assert_eq!(request.value(), U256::from(10_000_000_000_000_000u64));
        assert_eq!(request.gas(), 100_000);
        assert_eq!(request.nonce(), U256::ZERO);
        assert_eq!(request.data(), &payload());
    }

    #[test]
    fn test_schema_matches_forwarder_typehash() {
        assert_eq!(
            ForwardRequest::schema().encode_type(),
            "ForwardRequest(address from,address to,uint256 value,uint256 gas,uint256 nonce,bytes data)"
        );
        assert_eq!(
            hex::encode(ForwardRequest::schema().type_hash()),
            "dd8f4b70b0f4393e889bd39128a30628a78b61816a9eb8199759e7a349657e48"
        );
    }

    #[test]
    fn test_struct_hash_vector() {
        let request = complete_builder().build().unwrap();
        assert_eq!(
            hex::encode(request.struct_hash().unwrap()),
            "f88255a5db819e5862660e32cf2cd1bc82d8901cfbbb3e9d04ce2c60d12abee3"
        );
    }

    #[test]
    fn test_zero_target_rejected() {
        let result = complete_builder().to(Address::ZERO).build();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let missing_nonce = ForwardRequest::builder()
            .from(sender())
            .to(MEMBERSHIP.parse().unwrap())
            .gas(DEFAULT_GAS_LIMIT)
            .data(payload())
            .build();
        assert!(matches!(missing_nonce, Err(Error::Configuration { .. })));

        let missing_to = ForwardRequest::builder()
            .from(sender())
            .gas(DEFAULT_GAS_LIMIT)
            .nonce(U256::ZERO)
            .data(payload())
            .build();
        assert!(matches!(missing_to, Err(Error::Configuration { .. })));

        let missing_data = ForwardRequest::builder()
            .from(sender())
            .to(MEMBERSHIP.parse().unwrap())
            .gas(DEFAULT_GAS_LIMIT)
            .nonce(U256::ZERO)
            .build();
        assert!(matches!(missing_data, Err(Error::Encoding { .. })));
    }

    #[test]
    fn test_malformed_raw_data_rejected() {
        let result = ForwardRequest::builder().try_data(vec![0x48, 0xce, 0x24]);
        assert!(matches!(result, Err(Error::Encoding { .. })));

        let result = ForwardRequest::builder().try_data(vec![0u8; 4 + 33]);
        assert!(result.is_err());
    }

    #[test]
    fn test_value_defaults_to_zero() {
        let request = ForwardRequest::builder()
            .from(sender())
            .to(MEMBERSHIP.parse().unwrap())
            .gas(50_000)
            .nonce(U256::from(3u64))
            .data(payload())
            .build()
            .unwrap();
        assert_eq!(request.value(), U256::ZERO);
    }
}
