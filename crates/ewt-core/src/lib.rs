//! # ewt-core — Ethereum Web Token Core
//!
//! A lightweight, self-contained authentication token whose authenticity
//! is anchored to a blockchain account's signature over a structured,
//! canonically-hashed claims payload. This crate owns the claims data
//! model, the time-window validity policy, and the deterministic
//! projection of claims into the typed-data descriptor whose hash is the
//! signing target. The elliptic-curve signing and verification primitive
//! is the caller's collaborator, not ours.
//!
//! ## Key Design Principles
//!
//! 1. **One projection routine.** The sparse wire map and the typed-data
//!    schema both come from a single order-fixed projection, so the field
//!    sets a signer hashes and a verifier reconstructs cannot diverge.
//!
//! 2. **Fail-fast digests.** [`Claims::message_digest`] validates first;
//!    a signing digest is never produced from claims that fail the
//!    validity policy.
//!
//! 3. **Fixed signing domain.** The EIP-712 domain is built from
//!    compile-time constants and never mutated. Changing it is a protocol
//!    version bump, not a configuration knob.
//!
//! 4. **Unix-second `i64` timestamps.** The validity windows are plain
//!    integer comparisons; verifiers can reproduce them with any clock
//!    source via [`Claims::validate_at`].
//!
//! ## Crate Policy
//!
//! - Depends only on `ewt-coder` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod claims;
pub mod error;
pub mod token;

// Re-export primary types for ergonomic imports.
pub use claims::{Claims, DRIFT_SECS, MAX_VALIDITY_SECS};
pub use error::{EwtError, ValidationError};
pub use token::Token;

// The coder types that appear in this crate's public API.
pub use ewt_coder::{Digest, TypedData, TypedDataDomain, TypedDataField};

/// Fixed token prefix.
pub const EWT_PREFIX: &str = "eth";

/// Protocol version of the claims format.
pub const EWT_VERSION: &str = "1";

/// Name of the EIP-712 signing domain.
pub const EWT_DOMAIN_NAME: &str = "ETHWebToken";

/// The fixed EIP-712 signing domain: name and version only, no chain id,
/// no verifying contract, no salt.
pub fn eip712_domain() -> TypedDataDomain {
    TypedDataDomain {
        name: Some(EWT_DOMAIN_NAME.to_string()),
        version: Some(EWT_VERSION.to_string()),
        ..Default::default()
    }
}
