//! # ewt-coder — Typed Structured Data Hashing
//!
//! This crate turns a typed-data payload (schema, domain, message) into the
//! 32-byte digest that gets signed, following the EIP-712 hashing rules.
//! It is the leaf of the workspace: `ewt-core` builds its claims payloads on
//! top of it, and it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Schema-driven encoding.** Hashing walks the declared type schema,
//!    never the message object. Unknown message keys cannot shift the
//!    digest; declared fields with no value fail loudly.
//!
//! 2. **Strict type grammar.** Only canonical type names are accepted.
//!    The aliases `uint` and `int` are rejected because declared type
//!    strings are reproduced verbatim in `encodeType`, where an alias
//!    would silently change every type hash.
//!
//! 3. **Range-checked words.** Numeric values are rejected, not truncated,
//!    when they do not fit their declared width. A truncated word is a
//!    validly signed lie.
//!
//! 4. **`Digest` newtype.** All hashing entry points return [`Digest`],
//!    a 32-byte keccak-256 output with hex serialization. No bare
//!    `Vec<u8>` digests.
//!
//! ## Crate Policy
//!
//! - No dependencies on other workspace crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

mod abi;
pub mod error;
pub mod hash;
pub mod typed_data;

// Re-export primary types for ergonomic imports.
pub use error::TypedDataError;
pub use hash::{keccak256, Digest};
pub use typed_data::{TypedData, TypedDataDomain, TypedDataField, TypedDataTypes};
