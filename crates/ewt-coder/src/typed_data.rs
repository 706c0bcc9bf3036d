//! # Typed Structured Data Hashing (EIP-712)
//!
//! A typed-data payload carries a schema (`types`), a primary type name, a
//! signing domain, and a message object. Hashing proceeds bottom-up:
//!
//! 1. `encode_type` renders a struct schema as `Name(type1 name1,...)`,
//!    followed by every transitively referenced struct, sorted by name.
//! 2. `type_hash` is the keccak-256 of that rendering.
//! 3. `hash_struct` is the keccak-256 of the type hash followed by one
//!    32-byte word per field, in schema order.
//! 4. `encode_digest` is the keccak-256 of `0x19 0x01`, the domain
//!    separator, and the primary struct hash.
//!
//! ## Security Invariant
//!
//! The digest binds the schema as well as the values: two messages with
//! identical field values but different declared types or field order
//! produce different digests, and the `0x19 0x01` prefix keeps a typed-data
//! digest from colliding with any RLP payload. Encoding walks the schema,
//! never the message object, so unknown message keys cannot influence the
//! digest and missing ones fail loudly instead of hashing as empty.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::abi::{encode_atomic, AbiType};
use crate::error::TypedDataError;
use crate::hash::{keccak256, Digest};

/// One field declaration inside a struct schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// Struct schemas keyed by type name.
pub type TypedDataTypes = BTreeMap<String, Vec<TypedDataField>>;

/// The signing domain. Every field is optional; the schema under
/// `EIP712Domain` in the types table decides which fields participate in
/// the domain separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataDomain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "chainId", skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(rename = "verifyingContract", skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl TypedDataDomain {
    /// Project the domain into a message object, in the field order the
    /// domain type declares them. Absent fields are omitted entirely.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(version) = &self.version {
            map.insert("version".to_string(), Value::String(version.clone()));
        }
        if let Some(chain_id) = self.chain_id {
            map.insert("chainId".to_string(), Value::from(chain_id));
        }
        if let Some(contract) = &self.verifying_contract {
            map.insert(
                "verifyingContract".to_string(),
                Value::String(contract.clone()),
            );
        }
        if let Some(salt) = &self.salt {
            map.insert("salt".to_string(), Value::String(salt.clone()));
        }
        map
    }
}

/// A complete typed-data payload, shaped like the JSON argument of
/// `eth_signTypedData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedData {
    pub types: TypedDataTypes,
    #[serde(rename = "primaryType")]
    pub primary_type: String,
    pub domain: TypedDataDomain,
    pub message: Map<String, Value>,
}

impl TypedData {
    /// Render the canonical type string for `type_name`: the type itself,
    /// then every transitively referenced struct type sorted by name.
    pub fn encode_type(&self, type_name: &str) -> Result<String, TypedDataError> {
        let mut deps = BTreeSet::new();
        self.collect_referenced_types(type_name, &mut deps)?;
        deps.remove(type_name);

        let mut out = String::new();
        self.render_type(type_name, &mut out)?;
        for dep in &deps {
            self.render_type(dep, &mut out)?;
        }
        Ok(out)
    }

    /// keccak-256 of the canonical type string.
    pub fn type_hash(&self, type_name: &str) -> Result<Digest, TypedDataError> {
        Ok(Digest::from_bytes(keccak256(self.encode_type(type_name)?)))
    }

    /// Hash a struct instance: the type hash followed by one encoded word
    /// per declared field, keccak-256 over the concatenation.
    ///
    /// Fields absent from `data` are an error; keys in `data` that the
    /// schema does not declare are ignored.
    pub fn hash_struct(
        &self,
        type_name: &str,
        data: &Map<String, Value>,
    ) -> Result<Digest, TypedDataError> {
        let fields = self
            .types
            .get(type_name)
            .ok_or_else(|| TypedDataError::UnknownType(type_name.to_string()))?;

        let mut enc = Vec::with_capacity(32 * (fields.len() + 1));
        enc.extend_from_slice(self.type_hash(type_name)?.as_bytes());
        for field in fields {
            let qualified = format!("{type_name}.{}", field.name);
            let value = data
                .get(&field.name)
                .ok_or_else(|| TypedDataError::MissingValue(qualified.clone()))?;
            let ty = AbiType::parse(&field.field_type)?;
            let word = self.encode_value(&ty, &qualified, value)?;
            enc.extend_from_slice(&word);
        }
        Ok(Digest::from_bytes(keccak256(&enc)))
    }

    /// Hash of the domain object against the `EIP712Domain` schema.
    pub fn domain_separator(&self) -> Result<Digest, TypedDataError> {
        self.hash_struct("EIP712Domain", &self.domain.to_map())
    }

    /// The final signing digest:
    /// `keccak256(0x19 || 0x01 || domainSeparator || hashStruct(message))`.
    pub fn encode_digest(&self) -> Result<Digest, TypedDataError> {
        let domain = self.domain_separator()?;
        let message = self.hash_struct(&self.primary_type, &self.message)?;

        let mut buf = Vec::with_capacity(2 + 64);
        buf.extend_from_slice(&[0x19, 0x01]);
        buf.extend_from_slice(domain.as_bytes());
        buf.extend_from_slice(message.as_bytes());
        Ok(Digest::from_bytes(keccak256(&buf)))
    }

    /// Encode one value as its 32-byte word. Struct values hash to their
    /// struct hash, arrays to the keccak-256 of their concatenated element
    /// words, and leaf values to their padded or hashed atomic word.
    fn encode_value(
        &self,
        ty: &AbiType,
        field: &str,
        value: &Value,
    ) -> Result<[u8; 32], TypedDataError> {
        match ty {
            AbiType::Struct(name) => {
                let obj = value.as_object().ok_or_else(|| {
                    TypedDataError::value(field, format!("expected an object for type {name}"))
                })?;
                Ok(self.hash_struct(name, obj)?.into_bytes())
            }
            AbiType::Array(inner) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| TypedDataError::value(field, "expected an array"))?;
                self.hash_array(inner, field, items)
            }
            AbiType::FixedArray(inner, len) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| TypedDataError::value(field, "expected an array"))?;
                if items.len() != *len {
                    return Err(TypedDataError::value(
                        field,
                        format!("expected {len} elements, got {}", items.len()),
                    ));
                }
                self.hash_array(inner, field, items)
            }
            _ => encode_atomic(ty, field, value),
        }
    }

    fn hash_array(
        &self,
        inner: &AbiType,
        field: &str,
        items: &[Value],
    ) -> Result<[u8; 32], TypedDataError> {
        let mut enc = Vec::with_capacity(32 * items.len());
        for (i, item) in items.iter().enumerate() {
            let word = self.encode_value(inner, &format!("{field}[{i}]"), item)?;
            enc.extend_from_slice(&word);
        }
        Ok(keccak256(&enc))
    }

    /// Collect every struct type reachable from `type_name` into `deps`,
    /// including `type_name` itself when the schema is recursive. A struct
    /// reference with no schema entry is an error.
    fn collect_referenced_types(
        &self,
        type_name: &str,
        deps: &mut BTreeSet<String>,
    ) -> Result<(), TypedDataError> {
        let fields = self
            .types
            .get(type_name)
            .ok_or_else(|| TypedDataError::UnknownType(type_name.to_string()))?;

        for field in fields {
            let mut current = AbiType::parse(&field.field_type)?;
            // Unwrap array layers down to the element type.
            loop {
                match current {
                    AbiType::Array(inner) | AbiType::FixedArray(inner, _) => current = *inner,
                    AbiType::Struct(name) => {
                        if !self.types.contains_key(&name) {
                            return Err(TypedDataError::UnknownType(name));
                        }
                        if deps.insert(name.clone()) {
                            self.collect_referenced_types(&name, deps)?;
                        }
                        break;
                    }
                    _ => break,
                }
            }
        }
        Ok(())
    }

    fn render_type(&self, type_name: &str, out: &mut String) -> Result<(), TypedDataError> {
        let fields = self
            .types
            .get(type_name)
            .ok_or_else(|| TypedDataError::UnknownType(type_name.to_string()))?;
        out.push_str(type_name);
        out.push('(');
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&field.field_type);
            out.push(' ');
            out.push_str(&field.name);
        }
        out.push(')');
        Ok(())
    }
}
