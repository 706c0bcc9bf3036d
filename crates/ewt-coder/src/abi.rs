//! # ABI Type Grammar and Atomic Word Encoding
//!
//! Parses the type names that may appear in a typed-data schema and encodes
//! leaf values into the 32-byte words that feed struct hashing.
//!
//! ## Encoding Invariant
//!
//! Every value contributes exactly one 32-byte word to its parent struct
//! encoding: atomic values are padded into a word, dynamic values (`string`,
//! `bytes`) contribute the keccak-256 hash of their content. Divergence from
//! this layout on either side of the issuer/verifier boundary makes every
//! signature unverifiable, so inputs that do not fit their declared type are
//! rejected rather than coerced.
//!
//! ## Accepted grammar
//!
//! `string`, `bytes`, `bool`, `address`, `uint8..uint256` (multiples of 8),
//! `int8..int256`, `bytes1..bytes32`, arrays `T[]` / `T[k]`, and struct
//! names (resolved against the schema by the caller). The bare aliases
//! `uint` and `int` are rejected: declared type strings are reproduced
//! verbatim in `encodeType`, so an alias would change the type hash.

use serde_json::Value;

use crate::error::TypedDataError;
use crate::hash::{hex_to_bytes, keccak256};

/// A parsed typed-data type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AbiType {
    /// `string`: UTF-8 content, hashed.
    String,
    /// `bytes`: raw content from `0x` hex, hashed.
    Bytes,
    /// `bool`: one word, 0 or 1.
    Bool,
    /// `address`: 20 bytes, left-padded.
    Address,
    /// `uintN`: big-endian, right-aligned, range-checked against N bits.
    Uint(u16),
    /// `intN`: two's complement, sign-extended, range-checked against N bits.
    Int(u16),
    /// `bytesN`: N bytes, left-aligned.
    FixedBytes(u8),
    /// `T[]`: dynamic array.
    Array(Box<AbiType>),
    /// `T[k]`: fixed-length array.
    FixedArray(Box<AbiType>, usize),
    /// A struct name, resolved against the type schema.
    Struct(String),
}

impl AbiType {
    /// Parse a declared type string.
    pub(crate) fn parse(s: &str) -> Result<Self, TypedDataError> {
        if s.ends_with(']') {
            let open = s
                .rfind('[')
                .ok_or_else(|| TypedDataError::UnsupportedType(s.to_string()))?;
            let inner = Self::parse(&s[..open])?;
            let len_part = &s[open + 1..s.len() - 1];
            if len_part.is_empty() {
                return Ok(Self::Array(Box::new(inner)));
            }
            if !is_canonical_number(len_part) {
                return Err(TypedDataError::UnsupportedType(s.to_string()));
            }
            let len: usize = len_part
                .parse()
                .map_err(|_| TypedDataError::UnsupportedType(s.to_string()))?;
            return Ok(Self::FixedArray(Box::new(inner), len));
        }

        match s {
            "string" => return Ok(Self::String),
            "bytes" => return Ok(Self::Bytes),
            "bool" => return Ok(Self::Bool),
            "address" => return Ok(Self::Address),
            // Non-canonical aliases for uint256 / int256.
            "uint" | "int" => return Err(TypedDataError::UnsupportedType(s.to_string())),
            _ => {}
        }

        // An atomic prefix followed by digits is a width claim and must be
        // a valid one; only a non-digit suffix ("integer", "bytesish")
        // falls through to the struct-name grammar.
        if let Some(rest) = s.strip_prefix("uint") {
            if rest.bytes().all(|b| b.is_ascii_digit()) {
                return match rest.parse::<u16>() {
                    Ok(bits)
                        if !rest.starts_with('0')
                            && (8..=256).contains(&bits)
                            && bits % 8 == 0 =>
                    {
                        Ok(Self::Uint(bits))
                    }
                    _ => Err(TypedDataError::UnsupportedType(s.to_string())),
                };
            }
        } else if let Some(rest) = s.strip_prefix("int") {
            if rest.bytes().all(|b| b.is_ascii_digit()) {
                return match rest.parse::<u16>() {
                    Ok(bits)
                        if !rest.starts_with('0')
                            && (8..=256).contains(&bits)
                            && bits % 8 == 0 =>
                    {
                        Ok(Self::Int(bits))
                    }
                    _ => Err(TypedDataError::UnsupportedType(s.to_string())),
                };
            }
        } else if let Some(rest) = s.strip_prefix("bytes") {
            if rest.bytes().all(|b| b.is_ascii_digit()) {
                return match rest.parse::<u8>() {
                    Ok(n) if !rest.starts_with('0') && (1..=32).contains(&n) => {
                        Ok(Self::FixedBytes(n))
                    }
                    _ => Err(TypedDataError::UnsupportedType(s.to_string())),
                };
            }
        }

        if is_struct_name(s) {
            Ok(Self::Struct(s.to_string()))
        } else {
            Err(TypedDataError::UnsupportedType(s.to_string()))
        }
    }
}

/// Canonical array length: decimal digits with no sign and no leading
/// zero. `"0"` is rejected too, so `T[0]` and `T[01]` are both invalid.
fn is_canonical_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && !s.starts_with('0')
}

/// Struct names are identifiers: leading letter or underscore, then
/// letters, digits, or underscores.
fn is_struct_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Encode a leaf value as its 32-byte word.
///
/// Composite types (structs, arrays) are resolved by the caller against the
/// type schema before reaching this function.
pub(crate) fn encode_atomic(
    ty: &AbiType,
    field: &str,
    value: &Value,
) -> Result<[u8; 32], TypedDataError> {
    match ty {
        AbiType::String => {
            let s = value
                .as_str()
                .ok_or_else(|| TypedDataError::value(field, "expected a string"))?;
            Ok(keccak256(s.as_bytes()))
        }
        AbiType::Bytes => {
            let bytes = hex_value(field, value)?;
            Ok(keccak256(&bytes))
        }
        AbiType::Bool => {
            let b = value
                .as_bool()
                .ok_or_else(|| TypedDataError::value(field, "expected a boolean"))?;
            let mut word = [0u8; 32];
            word[31] = u8::from(b);
            Ok(word)
        }
        AbiType::Address => {
            let bytes = hex_value(field, value)?;
            if bytes.len() != 20 {
                return Err(TypedDataError::value(
                    field,
                    format!("address must be 20 bytes, got {}", bytes.len()),
                ));
            }
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(&bytes);
            Ok(word)
        }
        AbiType::Uint(bits) => {
            let word = uint_word(field, value)?;
            let need = word_bit_len(&word);
            if need > u32::from(*bits) {
                return Err(TypedDataError::value(
                    field,
                    format!("value needs {need} bits, exceeds uint{bits}"),
                ));
            }
            Ok(word)
        }
        AbiType::Int(bits) => int_word(field, value, *bits),
        AbiType::FixedBytes(n) => {
            let bytes = hex_value(field, value)?;
            if bytes.len() != usize::from(*n) {
                return Err(TypedDataError::value(
                    field,
                    format!("bytes{n} value must be {n} bytes, got {}", bytes.len()),
                ));
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(&bytes);
            Ok(word)
        }
        AbiType::Array(_) | AbiType::FixedArray(_, _) | AbiType::Struct(_) => Err(
            TypedDataError::value(field, "composite type reached the atomic encoder"),
        ),
    }
}

/// Extract `0x`-prefixed hex bytes from a string value.
fn hex_value(field: &str, value: &Value) -> Result<Vec<u8>, TypedDataError> {
    let s = value
        .as_str()
        .ok_or_else(|| TypedDataError::value(field, "expected a 0x hex string"))?;
    let s = s.trim();
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| TypedDataError::value(field, "hex string must start with 0x"))?;
    hex_to_bytes(hex).map_err(|e| TypedDataError::value(field, e))
}

/// Build the unsigned word from a JSON number, a decimal string, or a
/// `0x` hex string.
fn uint_word(field: &str, value: &Value) -> Result<[u8; 32], TypedDataError> {
    match value {
        Value::Number(n) => {
            let u = n.as_u64().ok_or_else(|| {
                TypedDataError::value(field, "expected a non-negative integer number")
            })?;
            let mut word = [0u8; 32];
            word[24..].copy_from_slice(&u.to_be_bytes());
            Ok(word)
        }
        Value::String(s) => {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                let bytes = hex_to_bytes(hex).map_err(|e| TypedDataError::value(field, e))?;
                if bytes.len() > 32 {
                    return Err(TypedDataError::value(
                        field,
                        format!("hex value is {} bytes, exceeds 32", bytes.len()),
                    ));
                }
                let mut word = [0u8; 32];
                word[32 - bytes.len()..].copy_from_slice(&bytes);
                Ok(word)
            } else {
                decimal_word(s).map_err(|e| TypedDataError::value(field, e))
            }
        }
        _ => Err(TypedDataError::value(
            field,
            "expected an unsigned integer as number, decimal string, or 0x hex string",
        )),
    }
}

/// Build the signed word: two's complement, sign-extended to 32 bytes.
///
/// Values are accepted as JSON numbers (within `i64`) or decimal strings
/// (within `i128`); that covers every `intN` width the signing side can
/// express without a big-integer literal.
fn int_word(field: &str, value: &Value, bits: u16) -> Result<[u8; 32], TypedDataError> {
    let v: i128 = match value {
        Value::Number(n) => i128::from(n.as_i64().ok_or_else(|| {
            TypedDataError::value(field, "expected an integer number within i64")
        })?),
        Value::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|e| TypedDataError::value(field, format!("invalid integer literal: {e}")))?,
        _ => {
            return Err(TypedDataError::value(
                field,
                "expected a signed integer as number or decimal string",
            ))
        }
    };

    // For widths below 128 the bounds fit in i128; at 128 and above any
    // i128 value is representable.
    if bits < 128 {
        let min = -(1i128 << (bits - 1));
        let max = (1i128 << (bits - 1)) - 1;
        if v < min || v > max {
            return Err(TypedDataError::value(
                field,
                format!("value {v} out of range for int{bits}"),
            ));
        }
    }

    let mut word = [if v < 0 { 0xffu8 } else { 0x00u8 }; 32];
    word[16..].copy_from_slice(&v.to_be_bytes());
    Ok(word)
}

/// Accumulate a decimal literal into a 256-bit big-endian word.
fn decimal_word(s: &str) -> Result<[u8; 32], String> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid decimal literal {s:?}"));
    }
    let mut word = [0u8; 32];
    for b in s.bytes() {
        let mut carry = u16::from(b - b'0');
        for byte in word.iter_mut().rev() {
            let v = u16::from(*byte) * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return Err("decimal value exceeds 256 bits".to_string());
        }
    }
    Ok(word)
}

/// Number of significant bits in a big-endian word.
fn word_bit_len(word: &[u8; 32]) -> u32 {
    for (i, b) in word.iter().enumerate() {
        if *b != 0 {
            return (31 - i as u32) * 8 + (8 - b.leading_zeros());
        }
    }
    0
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        /// Decimal-string and number forms of the same u64 encode to the
        /// same word.
        #[test]
        fn uint_forms_agree(v in any::<u64>()) {
            let n = encode_atomic(&AbiType::Uint(64), "n", &json!(v)).unwrap();
            let s = encode_atomic(&AbiType::Uint(64), "n", &json!(v.to_string())).unwrap();
            prop_assert_eq!(n, s);
        }

        /// The unsigned word is the value, big-endian, right-aligned.
        #[test]
        fn uint_word_layout(v in any::<u64>()) {
            let word = encode_atomic(&AbiType::Uint(256), "n", &json!(v)).unwrap();
            prop_assert!(word[..24].iter().all(|b| *b == 0));
            prop_assert_eq!(&word[24..], &v.to_be_bytes()[..]);
        }

        /// Signed encoding round-trips through two's complement.
        #[test]
        fn int_forms_agree(v in any::<i64>()) {
            let n = encode_atomic(&AbiType::Int(64), "n", &json!(v)).unwrap();
            let s = encode_atomic(&AbiType::Int(64), "n", &json!(v.to_string())).unwrap();
            prop_assert_eq!(n, s);
            let sign = if v < 0 { 0xffu8 } else { 0x00u8 };
            prop_assert!(n[..24].iter().all(|b| *b == sign));
            prop_assert_eq!(&n[24..], &v.to_be_bytes()[..]);
        }
    }
}
