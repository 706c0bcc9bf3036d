//! # Claims — The Assertions Set and Its Digest Contract
//!
//! A claims set carries who issued the token, when it was issued, when it
//! stops being acceptable, and a handful of optional context fields. Two
//! independent implementations must derive byte-identical signing digests
//! from the same claims, so everything observable here is normative: the
//! wire keys, the field order, the absence rules, and the typed-data
//! schema all come from one projection routine.
//!
//! ## Security Invariant
//!
//! The sparse map projection and the typed-data field schema are produced
//! by the same order-fixed routine. They cannot diverge, so the message a
//! verifier reconstructs always hashes against the same type string the
//! issuer signed.
//!
//! ## Validity Policy
//!
//! Validation is a window check around the verifier's clock. `DRIFT_SECS`
//! absorbs clock skew between issuer and verifier on both edges: a token
//! issued up to five minutes in the future is accepted, and a token is
//! still accepted up to five minutes past its expiry. `MAX_VALIDITY_SECS`
//! caps the window at a year plus the drift allowance. There is no
//! `expires_at > issued_at` rule.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ewt_coder::{Digest, TypedData, TypedDataField, TypedDataTypes};

use crate::eip712_domain;
use crate::error::{EwtError, ValidationError};

/// Accepted clock skew between issuer and verifier, in seconds.
pub const DRIFT_SECS: i64 = 300;

/// Outer bound of the validity window: one year plus the drift allowance.
pub const MAX_VALIDITY_SECS: i64 = 365 * 24 * 3600 + DRIFT_SECS;

/// The assertions carried by a token.
///
/// A field holding its absent value (`0` for the integers, `""` for the
/// strings) is omitted from the wire form, the projection, and the
/// typed-data schema alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuing application identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app: String,

    /// Issuance time, unix seconds.
    #[serde(rename = "iat", default, skip_serializing_if = "is_zero_i64")]
    pub issued_at: i64,

    /// Expiry time, unix seconds.
    #[serde(rename = "exp", default, skip_serializing_if = "is_zero_i64")]
    pub expires_at: i64,

    /// Caller-chosen nonce.
    #[serde(rename = "n", default, skip_serializing_if = "is_zero_u64")]
    pub nonce: u64,

    /// Token type label.
    #[serde(rename = "typ", default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,

    /// Requesting origin.
    #[serde(rename = "ogn", default, skip_serializing_if = "String::is_empty")]
    pub origin: String,

    /// Protocol version of the claims format.
    #[serde(rename = "v", default, skip_serializing_if = "String::is_empty")]
    pub ewt_version: String,
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

impl Claims {
    /// Stamp `issued_at` with the current wall clock.
    pub fn set_issued_at_now(&mut self) {
        self.issued_at = Utc::now().timestamp();
    }

    /// Set `expires_at` to the current wall clock plus `ttl`.
    pub fn set_expiry_in(&mut self, ttl: Duration) {
        self.expires_at = Utc::now().timestamp().saturating_add(ttl.num_seconds());
    }

    /// Check the validity policy against the current wall clock.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_at(Utc::now().timestamp())
    }

    /// Check the validity policy against a caller-supplied clock reading.
    ///
    /// Rules apply in a fixed order and the first violation wins: version
    /// presence, app presence, the `issued_at` window, the `expires_at`
    /// window. Absent timestamps fail their window check like any other
    /// out-of-window value. Window bounds saturate at the `i64` extremes.
    pub fn validate_at(&self, now: i64) -> Result<(), ValidationError> {
        if self.ewt_version.is_empty() {
            return Err(ValidationError::EmptyVersion);
        }
        if self.app.is_empty() {
            return Err(ValidationError::EmptyApp);
        }
        if self.issued_at > now.saturating_add(DRIFT_SECS)
            || self.issued_at < now.saturating_sub(MAX_VALIDITY_SECS)
        {
            return Err(ValidationError::InvalidIssuedAt);
        }
        if self.expires_at < now.saturating_sub(DRIFT_SECS)
            || self.expires_at > now.saturating_add(MAX_VALIDITY_SECS)
        {
            return Err(ValidationError::Expired);
        }
        Ok(())
    }

    /// Project the claims into an ordered sparse map: wire keys in
    /// declared order, absent fields omitted.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, _, value) in self.projection() {
            map.insert(key.to_string(), value);
        }
        map
    }

    /// Build the typed-data descriptor for these claims: the fixed signing
    /// domain, a `Claims` schema with one entry per present field, and the
    /// sparse map as the message.
    ///
    /// Fails with [`EwtError::EmptyClaims`] when every field is absent.
    pub fn typed_data(&self) -> Result<TypedData, EwtError> {
        let fields = self.projection();
        if fields.is_empty() {
            return Err(EwtError::EmptyClaims);
        }

        let mut schema = Vec::with_capacity(fields.len());
        let mut message = Map::new();
        for (key, abi_type, value) in fields {
            schema.push(TypedDataField::new(key, abi_type));
            message.insert(key.to_string(), value);
        }

        let mut types = TypedDataTypes::new();
        types.insert(
            "EIP712Domain".to_string(),
            vec![
                TypedDataField::new("name", "string"),
                TypedDataField::new("version", "string"),
            ],
        );
        types.insert("Claims".to_string(), schema);

        Ok(TypedData {
            types,
            primary_type: "Claims".to_string(),
            domain: eip712_domain(),
            message,
        })
    }

    /// Compute the 32-byte signing digest for these claims.
    ///
    /// Validates first; a digest is never produced from claims that fail
    /// the validity policy.
    pub fn message_digest(&self) -> Result<Digest, EwtError> {
        self.validate()?;
        let digest = self.typed_data()?.encode_digest()?;
        Ok(digest)
    }

    /// The single source of truth for the wire contract: one entry per
    /// present field, in declared order, carrying the wire key, the ABI
    /// type tag, and the projected value.
    fn projection(&self) -> Vec<(&'static str, &'static str, Value)> {
        let mut fields = Vec::with_capacity(7);
        if !self.app.is_empty() {
            fields.push(("app", "string", Value::String(self.app.clone())));
        }
        if self.issued_at != 0 {
            fields.push(("iat", "int64", Value::from(self.issued_at)));
        }
        if self.expires_at != 0 {
            fields.push(("exp", "int64", Value::from(self.expires_at)));
        }
        if self.nonce != 0 {
            fields.push(("n", "uint64", Value::from(self.nonce)));
        }
        if !self.token_type.is_empty() {
            fields.push(("typ", "string", Value::String(self.token_type.clone())));
        }
        if !self.origin.is_empty() {
            fields.push(("ogn", "string", Value::String(self.origin.clone())));
        }
        if !self.ewt_version.is_empty() {
            fields.push(("v", "string", Value::String(self.ewt_version.clone())));
        }
        fields
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        /// Arbitrary claims across the whole absent/present lattice.
        fn arb_claims()(
            app in "[a-zA-Z0-9]{0,12}",
            issued_at in 0i64..2_000_000_000,
            expires_at in 0i64..2_000_000_000,
            nonce in any::<u64>(),
            token_type in "[a-z]{0,8}",
            origin in "[a-z:/.]{0,16}",
            ewt_version in "[0-9]{0,2}",
        ) -> Claims {
            Claims { app, issued_at, expires_at, nonce, token_type, origin, ewt_version }
        }
    }

    proptest! {
        /// The serde wire form and the sparse projection agree for every
        /// combination of present and absent fields.
        #[test]
        fn serde_form_equals_projection(claims in arb_claims()) {
            prop_assert_eq!(
                serde_json::to_value(&claims).unwrap(),
                Value::Object(claims.to_map())
            );
        }

        /// The typed-data schema names always mirror the message keys.
        #[test]
        fn schema_mirrors_message(claims in arb_claims()) {
            if claims.to_map().is_empty() {
                prop_assert!(matches!(claims.typed_data(), Err(EwtError::EmptyClaims)));
            } else {
                let td = claims.typed_data().unwrap();
                let schema: Vec<String> =
                    td.types["Claims"].iter().map(|f| f.name.clone()).collect();
                let keys: Vec<String> = td.message.keys().cloned().collect();
                prop_assert_eq!(schema, keys);
            }
        }

        /// Digesting is deterministic for any non-empty claims set.
        #[test]
        fn digest_is_deterministic(claims in arb_claims()) {
            if let Ok(td) = claims.typed_data() {
                let d1 = td.encode_digest().unwrap();
                let d2 = claims.typed_data().unwrap().encode_digest().unwrap();
                prop_assert_eq!(d1, d2);
            }
        }

        /// Serde round-trips through the wire keys.
        #[test]
        fn serde_round_trip(claims in arb_claims()) {
            let json = serde_json::to_string(&claims).unwrap();
            let back: Claims = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(claims, back);
        }
    }
}
