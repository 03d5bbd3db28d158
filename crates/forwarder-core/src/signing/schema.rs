//! EIP-712 type schemas and the schema-driven `hashStruct`.
//!
//! A [`TypedSchema`] is an ordered field list. Field order is part of the
//! type string and therefore of the type hash, so reordering fields yields
//! a different digest.

use std::collections::BTreeMap;
use std::fmt;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// EIP-712 member types used by the domain and forward-request structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Address,
    Uint256,
    Bytes,
    Bytes32,
    Bool,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Address => "address",
            FieldType::Uint256 => "uint256",
            FieldType::Bytes => "bytes",
            FieldType::Bytes32 => "bytes32",
            FieldType::Bool => "bool",
        }
    }

    /// Dynamic types are hashed and the hash is encoded in place of the value.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Bytes)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(name, type)` member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

/// A named struct type with an ordered member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedSchema {
    type_name: String,
    fields: Vec<SchemaField>,
}

/// A value for one struct member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    String(String),
    Address(Address),
    Uint(U256),
    Bytes(Bytes),
    Bytes32(B256),
    Bool(bool),
}

/// Member values keyed by field name.
pub type TypedMessage = BTreeMap<String, TypedValue>;

impl TypedValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            TypedValue::String(_) => FieldType::String,
            TypedValue::Address(_) => FieldType::Address,
            TypedValue::Uint(_) => FieldType::Uint256,
            TypedValue::Bytes(_) => FieldType::Bytes,
            TypedValue::Bytes32(_) => FieldType::Bytes32,
            TypedValue::Bool(_) => FieldType::Bool,
        }
    }

    /// `encodeData` word for this value.
    fn encode_word(&self) -> B256 {
        match self {
            TypedValue::String(text) => keccak256(text.as_bytes()),
            TypedValue::Bytes(bytes) => keccak256(bytes),
            TypedValue::Address(address) => B256::left_padding_from(address.as_slice()),
            TypedValue::Uint(value) => B256::from(value.to_be_bytes::<32>()),
            TypedValue::Bytes32(word) => *word,
            TypedValue::Bool(flag) => B256::with_last_byte(u8::from(*flag)),
        }
    }
}

impl TypedSchema {
    pub fn new<'a>(
        type_name: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, FieldType)>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| SchemaField {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Canonical type string, e.g. `Mail(address from,string contents)`.
    pub fn encode_type(&self) -> String {
        let members: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{} {}", field.ty, field.name))
            .collect();
        format!("{}({})", self.type_name, members.join(","))
    }

    pub fn type_hash(&self) -> B256 {
        keccak256(self.encode_type().as_bytes())
    }

    /// `typeHash ‖ enc(field_0) ‖ ... ‖ enc(field_n)` in declared order.
    pub fn encode_data(&self, message: &TypedMessage) -> Result<Vec<u8>> {
        let mut encoded = Vec::with_capacity(32 * (self.fields.len() + 1));
        encoded.extend_from_slice(self.type_hash().as_slice());

        for field in &self.fields {
            let value = message.get(&field.name).ok_or_else(|| {
                Error::signing(format!(
                    "{} field `{}` is missing from the message",
                    self.type_name, field.name
                ))
            })?;

            if value.field_type() != field.ty {
                return Err(Error::signing(format!(
                    "{} field `{}` expects {}, got {}",
                    self.type_name,
                    field.name,
                    field.ty,
                    value.field_type()
                )));
            }

            encoded.extend_from_slice(value.encode_word().as_slice());
        }

        Ok(encoded)
    }

    /// `hashStruct(message) = keccak256(encodeData(message))`.
    pub fn hash_struct(&self, message: &TypedMessage) -> Result<B256> {
        Ok(keccak256(self.encode_data(message)?))
    }
}
