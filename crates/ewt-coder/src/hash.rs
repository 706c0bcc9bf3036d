//! # Keccak-256 Digest Computation
//!
//! The hash primitive behind every typed-data operation in this crate:
//! type hashes, struct hashes, domain separators, and the final signing
//! digest are all keccak-256 values.
//!
//! `Digest` is the 32-byte output newtype. It renders as lowercase hex and
//! serializes as a hex string, so digests survive JSON transport without a
//! binary encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest as _, Keccak256};

use crate::error::TypedDataError;

/// Compute the keccak-256 hash of raw bytes.
///
/// This is the hash function fixed by the typed-data scheme; it is the
/// legacy Keccak padding, not NIST SHA3-256.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let hash = Keccak256::digest(data.as_ref());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

/// A 32-byte canonical typed-data digest.
///
/// Produced by [`TypedData::encode_digest()`](crate::TypedData::encode_digest)
/// and by the intermediate hashing steps (type hash, struct hash, domain
/// separator). The digest is the exact byte string handed to the external
/// signing step; two implementations that disagree on even one byte here
/// cannot verify each other's signatures.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw 32 bytes as a digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Consume the digest, returning the raw bytes.
    pub fn into_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Render the digest as a lowercase hex string (no `0x` prefix).
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Parse a digest from a 64-character hex string, with or without a
    /// leading `0x`.
    pub fn from_hex(hex: &str) -> Result<Self, TypedDataError> {
        let hex = strip_hex_prefix(hex.trim());
        if hex.len() != 64 {
            return Err(TypedDataError::InvalidDigest(format!(
                "expected 64 hex chars, got {}",
                hex.len()
            )));
        }
        let bytes = hex_to_bytes(hex).map_err(TypedDataError::InvalidDigest)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Hex utilities (no external hex crate dependency)
// ---------------------------------------------------------------------------

/// Drop a leading `0x`/`0X` if present.
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

/// Encode bytes as lowercase hex.
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode an even-length hex string (no prefix) to bytes.
///
/// Decoding walks the raw bytes, so input containing multi-byte characters
/// is rejected like any other non-hex byte instead of tripping over a char
/// boundary.
pub(crate) fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    hex.as_bytes()
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| match (hex_nibble(pair[0]), hex_nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(format!("invalid hex at position {}", 2 * i)),
        })
        .collect()
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
