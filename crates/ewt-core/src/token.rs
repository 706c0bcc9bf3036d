//! # Token — The Signed Envelope
//!
//! A token wraps a claims set together with the account that vouches for
//! it: the fixed protocol prefix, the account address, the claims, and the
//! signature over the claims digest. Producing and checking that signature
//! is the caller's job; the envelope only carries the material and
//! delegates digest computation to the claims.

use serde::{Deserialize, Serialize};

use ewt_coder::{Digest, TypedData};

use crate::claims::Claims;
use crate::error::EwtError;
use crate::{EWT_PREFIX, EWT_VERSION};

/// A claims set bound to an account.
///
/// `address` and `signature` are hex strings populated by the caller; both
/// start empty. Once a digest has been signed the token should be treated
/// as immutable, since any claims change invalidates the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Fixed protocol prefix, always [`EWT_PREFIX`].
    pub prefix: String,

    /// Signing account address, hex.
    pub address: String,

    /// The assertions the signature covers.
    pub claims: Claims,

    /// Signature over the claims digest, hex. Empty until signed.
    pub signature: String,
}

impl Token {
    /// A fresh token: protocol prefix and claims version pre-populated,
    /// everything else left for the caller.
    pub fn new() -> Self {
        Self {
            prefix: EWT_PREFIX.to_string(),
            address: String::new(),
            claims: Claims {
                ewt_version: EWT_VERSION.to_string(),
                ..Default::default()
            },
            signature: String::new(),
        }
    }

    /// The signing digest of the embedded claims.
    pub fn message_digest(&self) -> Result<Digest, EwtError> {
        self.claims.message_digest()
    }

    /// The typed-data descriptor of the embedded claims.
    pub fn message_typed_data(&self) -> Result<TypedData, EwtError> {
        self.claims.typed_data()
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}
