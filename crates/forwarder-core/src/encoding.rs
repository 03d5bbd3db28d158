//! Contract call encoding.
//!
//! Produces the exact call payload a Solidity dispatcher expects for
//! functions taking static `uint256` and `address` parameters:
//! `selector ‖ word_0 ‖ word_1 ‖ ...`, each word 32 bytes.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{keccak256, Address, Bytes, U256};

use crate::{Error, Result};

/// Canonical signature of the membership contract's relayed renewal entry point.
pub const META_RENEW_MEMBERSHIP_SIGNATURE: &str = "metaRenewMembership(uint256,uint256,address)";

/// Size of one ABI word.
pub const WORD_SIZE: usize = 32;

/// Size of a function selector.
pub const SELECTOR_SIZE: usize = 4;

const ADDRESS_SIZE: usize = 20;

/// Static ABI parameter types supported by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiType {
    Uint256,
    Address,
}

impl AbiType {
    /// Canonical type name as it appears in a function signature.
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiType::Uint256 => "uint256",
            AbiType::Address => "address",
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbiType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uint256" => Ok(AbiType::Uint256),
            "address" => Ok(AbiType::Address),
            other => Err(Error::encoding(format!(
                "unsupported parameter type `{}` (expected uint256 or address)",
                other
            ))),
        }
    }
}

/// A typed call argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallArg {
    Uint(U256),
    Address(Address),
}

impl CallArg {
    pub fn uint(value: U256) -> Self {
        CallArg::Uint(value)
    }

    /// Parse a decimal integer argument.
    ///
    /// Negative values and values above `2^256 - 1` are rejected rather than
    /// wrapped or truncated.
    pub fn uint_from_dec_str(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.starts_with('-') {
            return Err(Error::encoding(format!(
                "uint256 argument must not be negative: {}",
                text
            )));
        }
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::encoding(format!(
                "uint256 argument is not a decimal integer: `{}`",
                text
            )));
        }

        U256::from_str_radix(text, 10)
            .map(CallArg::Uint)
            .map_err(|_| Error::encoding(format!("uint256 argument exceeds 256 bits: {}", text)))
    }

    /// Build a uint argument from a signed value, rejecting negatives.
    pub fn uint_from_i128(value: i128) -> Result<Self> {
        u128::try_from(value)
            .map(|v| CallArg::Uint(U256::from(v)))
            .map_err(|_| {
                Error::encoding(format!("uint256 argument must not be negative: {}", value))
            })
    }

    /// Build a uint argument from big-endian bytes of any length.
    ///
    /// Leading zero bytes are ignored, so wide inputs are accepted as long as
    /// the value itself fits in 256 bits.
    pub fn uint_from_be_bytes(bytes: &[u8]) -> Result<Self> {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        U256::try_from_be_slice(&bytes[start..])
            .map(CallArg::Uint)
            .ok_or_else(|| {
                Error::encoding(format!(
                    "uint256 argument exceeds 256 bits ({} bytes)",
                    bytes.len()
                ))
            })
    }

    /// Build an address argument from raw bytes; exactly 20 bytes are required.
    pub fn address_from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ADDRESS_SIZE {
            return Err(Error::encoding(format!(
                "address argument must be 20 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(CallArg::Address(Address::from_slice(bytes)))
    }

    /// Build an address argument from hex text, with or without `0x`.
    pub fn address_from_hex(text: &str) -> Result<Self> {
        let raw = hex::decode(text.trim().trim_start_matches("0x"))
            .map_err(|e| Error::encoding(format!("address argument is not hex: {}", e)))?;
        Self::address_from_slice(&raw)
    }

    pub fn abi_type(&self) -> AbiType {
        match self {
            CallArg::Uint(_) => AbiType::Uint256,
            CallArg::Address(_) => AbiType::Address,
        }
    }

    /// Encode as one 32-byte ABI word.
    pub fn to_word(&self) -> [u8; WORD_SIZE] {
        match self {
            CallArg::Uint(value) => value.to_be_bytes::<WORD_SIZE>(),
            CallArg::Address(address) => {
                // address left-padded to 32 bytes
                let mut word = [0u8; WORD_SIZE];
                word[WORD_SIZE - ADDRESS_SIZE..].copy_from_slice(address.as_slice());
                word
            }
        }
    }
}

impl From<Address> for CallArg {
    fn from(address: Address) -> Self {
        CallArg::Address(address)
    }
}

impl From<U256> for CallArg {
    fn from(value: U256) -> Self {
        CallArg::Uint(value)
    }
}

/// A canonical function signature such as `transfer(address,uint256)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    name: String,
    params: Vec<AbiType>,
}

impl FunctionSignature {
    /// Parse canonical signature text. Whitespace is not allowed, as it
    /// would change the selector.
    pub fn parse(signature: &str) -> Result<Self> {
        let invalid = || Error::encoding(format!("malformed function signature `{}`", signature));

        let open = signature.find('(').ok_or_else(invalid)?;
        if !signature.ends_with(')') {
            return Err(invalid());
        }

        let name = &signature[..open];
        let valid_name = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if !valid_name {
            return Err(invalid());
        }

        let inner = &signature[open + 1..signature.len() - 1];
        let params = if inner.is_empty() {
            Vec::new()
        } else {
            inner
                .split(',')
                .map(AbiType::from_str)
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            name: name.to_string(),
            params,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[AbiType] {
        &self.params
    }

    /// Canonical text, e.g. `metaRenewMembership(uint256,uint256,address)`.
    pub fn canonical(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(AbiType::as_str).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// First four bytes of keccak-256 over the canonical text.
    pub fn selector(&self) -> [u8; SELECTOR_SIZE] {
        let hash = keccak256(self.canonical().as_bytes());
        let mut selector = [0u8; SELECTOR_SIZE];
        selector.copy_from_slice(&hash[..SELECTOR_SIZE]);
        selector
    }
}

impl FromStr for FunctionSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// An on-chain call payload: `selector ‖ 32-byte words`.
///
/// Can only be constructed through the encoder or through
/// [`CallPayload::from_bytes`], which enforces the word alignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallPayload(Bytes);

impl CallPayload {
    /// Wrap existing calldata, checking `len >= 4` and word alignment.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < SELECTOR_SIZE {
            return Err(Error::encoding(format!(
                "call payload must start with a 4-byte selector, got {} bytes",
                bytes.len()
            )));
        }
        if (bytes.len() - SELECTOR_SIZE) % WORD_SIZE != 0 {
            return Err(Error::encoding(format!(
                "call payload arguments are not 32-byte aligned ({} bytes after selector)",
                bytes.len() - SELECTOR_SIZE
            )));
        }
        Ok(Self(bytes))
    }

    /// Parse `0x`-prefixed (or bare) hex calldata.
    pub fn from_hex(text: &str) -> Result<Self> {
        let raw = hex::decode(text.trim().trim_start_matches("0x"))
            .map_err(|e| Error::encoding(format!("call payload is not hex: {}", e)))?;
        Self::from_bytes(raw)
    }

    pub fn selector(&self) -> [u8; SELECTOR_SIZE] {
        let mut selector = [0u8; SELECTOR_SIZE];
        selector.copy_from_slice(&self.0[..SELECTOR_SIZE]);
        selector
    }

    /// The argument words following the selector.
    pub fn words(&self) -> impl Iterator<Item = &[u8]> {
        self.0[SELECTOR_SIZE..].chunks_exact(WORD_SIZE)
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a payload carries at least a selector.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl AsRef<[u8]> for CallPayload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for CallPayload {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for CallPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Encode a call from its canonical signature and arguments.
pub fn encode_call(signature: &FunctionSignature, args: &[CallArg]) -> Result<CallPayload> {
    encode_call_with_selector(signature.selector(), signature.params(), args)
        .map_err(|e| match e {
            Error::Encoding { message } => Error::encoding(format!("{}: {}", signature, message)),
            other => other,
        })
}

/// Encode a call from a precomputed selector and declared parameter types.
pub fn encode_call_with_selector(
    selector: [u8; SELECTOR_SIZE],
    params: &[AbiType],
    args: &[CallArg],
) -> Result<CallPayload> {
    if params.len() != args.len() {
        return Err(Error::encoding(format!(
            "expected {} arguments, got {}",
            params.len(),
            args.len()
        )));
    }

    let mut data = Vec::with_capacity(SELECTOR_SIZE + WORD_SIZE * args.len());
    data.extend_from_slice(&selector);

    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        if *param != arg.abi_type() {
            return Err(Error::encoding(format!(
                "argument {} must be {}, got {}",
                index,
                param,
                arg.abi_type()
            )));
        }
        data.extend_from_slice(&arg.to_word());
    }

    CallPayload::from_bytes(data)
}

/// Build calldata for `metaRenewMembership(tokenId, duration, beneficiary)`.
pub fn meta_renew_membership(
    token_id: U256,
    duration_secs: U256,
    beneficiary: Address,
) -> Result<CallPayload> {
    let signature = FunctionSignature::parse(META_RENEW_MEMBERSHIP_SIGNATURE)?;
    encode_call(
        &signature,
        &[
            CallArg::Uint(token_id),
            CallArg::Uint(duration_secs),
            CallArg::Address(beneficiary),
        ],
    )
}
