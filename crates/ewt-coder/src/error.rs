//! # Error Types for Typed Data Encoding
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations. Encoding fails loudly with the offending type or field
//! named in the message; a digest is never produced from a schema or value
//! the encoder could not fully account for.

use thiserror::Error;

/// Error during typed-data schema resolution or value encoding.
#[derive(Error, Debug)]
pub enum TypedDataError {
    /// A field references a struct type that is not present in the
    /// type schema.
    #[error("unknown type {0:?} referenced from type schema")]
    UnknownType(String),

    /// The type schema declares a field for which the message carries
    /// no value.
    #[error("message has no value for field {0:?}")]
    MissingValue(String),

    /// A declared type name is outside the accepted grammar. Includes the
    /// non-canonical aliases `uint` and `int`: the declared string goes
    /// verbatim into `encodeType`, so accepting an alias would silently
    /// change the type hash.
    #[error("unsupported type {0:?} in type schema")]
    UnsupportedType(String),

    /// A message value could not be encoded as its declared type.
    #[error("cannot encode field {field:?}: {reason}")]
    ValueEncoding {
        /// Name of the field being encoded.
        field: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// A digest literal had invalid hex encoding or the wrong length.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

impl TypedDataError {
    /// Shorthand for a `ValueEncoding` error.
    pub(crate) fn value(field: &str, reason: impl Into<String>) -> Self {
        Self::ValueEncoding {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
