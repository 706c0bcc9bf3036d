//! # Error Types — Claims and Token Failures
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations. The validity rules and the digest pipeline fail with
//! distinct variants so callers can tell a policy rejection (bad or stale
//! claims) apart from an encoding failure (malformed payload).

use thiserror::Error;

use ewt_coder::TypedDataError;

/// A claims validity rule was violated.
///
/// Rules are checked in a fixed order and the first violation wins, so a
/// claims set with several problems always reports the same one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The protocol version field is unset.
    #[error("ewt version is empty")]
    EmptyVersion,

    /// The issuing application field is unset.
    #[error("app is empty")]
    EmptyApp,

    /// `issued_at` lies outside the accepted window around now.
    #[error("iat is invalid")]
    InvalidIssuedAt,

    /// `expires_at` lies outside the accepted window around now.
    #[error("token has expired")]
    Expired,
}

/// Top-level error type for token and digest operations.
#[derive(Error, Debug)]
pub enum EwtError {
    /// The claims failed their validity policy.
    #[error("claims are invalid: {0}")]
    InvalidClaims(#[from] ValidationError),

    /// Every claims field is absent; there is nothing to hash.
    #[error("claims are empty")]
    EmptyClaims,

    /// The typed-data encoder rejected the claims payload.
    #[error("failed to compute claims message digest: {0}")]
    Digest(#[from] TypedDataError),
}
