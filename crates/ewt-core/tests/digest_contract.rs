//! # Cross-Implementation Digest Contract Tests
//!
//! An issuer and a verifier built independently must derive byte-identical
//! signing digests from the same claims. These tests pin every observable
//! piece of that contract: the canonical `Claims` type string, the sparse
//! projection across all 2^7 present/absent combinations, the wire JSON
//! form, the validity windows, and the final digest.
//!
//! ## How It Works
//!
//! 1. **First-principles recomputation**: the expected digest is rebuilt
//!    here from nothing but `keccak256`, following the typed-data hashing
//!    rules step by step, and compared against the pipeline's output. Any
//!    divergence in type rendering, word encoding, or hash composition
//!    fails these tests even if both sides of the library agree with each
//!    other.
//!
//! 2. **Exhaustive projection sweep**: every combination of absent fields
//!    is checked against an independently computed expected key list.

use chrono::Duration;
use ewt_coder::{keccak256, Digest};
use ewt_core::{
    eip712_domain, Claims, EwtError, Token, ValidationError, DRIFT_SECS, MAX_VALIDITY_SECS,
};

/// Claims with every field present, timestamps fixed for reproducibility.
fn full_claims() -> Claims {
    Claims {
        app: "TokenApp".to_string(),
        issued_at: 1_600_000_000,
        expires_at: 1_600_086_400,
        nonce: 1_234_567_890,
        token_type: "session".to_string(),
        origin: "https://example.com".to_string(),
        ewt_version: "1".to_string(),
    }
}

fn int64_word(v: i64) -> [u8; 32] {
    let mut word = [if v < 0 { 0xffu8 } else { 0x00u8 }; 32];
    word[24..].copy_from_slice(&v.to_be_bytes());
    word
}

fn uint64_word(v: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&v.to_be_bytes());
    word
}

// ---------------------------------------------------------------------------
// The canonical type string
// ---------------------------------------------------------------------------

const FULL_CLAIMS_TYPE: &str =
    "Claims(string app,int64 iat,int64 exp,uint64 n,string typ,string ogn,string v)";

#[test]
fn test_full_claims_type_string() {
    let td = full_claims().typed_data().unwrap();
    assert_eq!(td.encode_type("Claims").unwrap(), FULL_CLAIMS_TYPE);
}

#[test]
fn test_sparse_claims_type_string() {
    let claims = Claims {
        app: "TokenApp".to_string(),
        nonce: 7,
        ewt_version: "1".to_string(),
        ..Default::default()
    };
    let td = claims.typed_data().unwrap();
    assert_eq!(
        td.encode_type("Claims").unwrap(),
        "Claims(string app,uint64 n,string v)"
    );
}

// ---------------------------------------------------------------------------
// First-principles digest recomputation
// ---------------------------------------------------------------------------

#[test]
fn test_domain_separator_from_first_principles() {
    let td = full_claims().typed_data().unwrap();

    let mut enc = Vec::new();
    enc.extend_from_slice(&keccak256("EIP712Domain(string name,string version)"));
    enc.extend_from_slice(&keccak256("ETHWebToken"));
    enc.extend_from_slice(&keccak256("1"));
    let expected = Digest::from_bytes(keccak256(&enc));

    assert_eq!(td.domain_separator().unwrap(), expected);
}

#[test]
fn test_message_digest_from_first_principles() {
    let claims = full_claims();

    // hashStruct(Claims): type hash, then one word per field in declared
    // order. Strings hash their content, integers pad to 32 bytes.
    let mut enc = Vec::new();
    enc.extend_from_slice(&keccak256(FULL_CLAIMS_TYPE));
    enc.extend_from_slice(&keccak256(claims.app.as_bytes()));
    enc.extend_from_slice(&int64_word(claims.issued_at));
    enc.extend_from_slice(&int64_word(claims.expires_at));
    enc.extend_from_slice(&uint64_word(claims.nonce));
    enc.extend_from_slice(&keccak256(claims.token_type.as_bytes()));
    enc.extend_from_slice(&keccak256(claims.origin.as_bytes()));
    enc.extend_from_slice(&keccak256(claims.ewt_version.as_bytes()));
    let struct_hash = keccak256(&enc);

    let mut domain_enc = Vec::new();
    domain_enc.extend_from_slice(&keccak256("EIP712Domain(string name,string version)"));
    domain_enc.extend_from_slice(&keccak256("ETHWebToken"));
    domain_enc.extend_from_slice(&keccak256("1"));
    let domain_separator = keccak256(&domain_enc);

    let mut preimage = Vec::new();
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(&domain_separator);
    preimage.extend_from_slice(&struct_hash);
    let expected = Digest::from_bytes(keccak256(&preimage));

    let td = claims.typed_data().unwrap();
    assert_eq!(td.encode_digest().unwrap(), expected);

    // The negative timestamp path sign-extends instead of zero-padding.
    let mut backdated = claims.clone();
    backdated.issued_at = -1;
    assert_eq!(int64_word(-1), [0xffu8; 32]);
    assert_ne!(
        backdated.typed_data().unwrap().encode_digest().unwrap(),
        expected
    );
}

// ---------------------------------------------------------------------------
// Exhaustive projection sweep
// ---------------------------------------------------------------------------

#[test]
fn test_projection_sweep_all_combinations() {
    const KEYS: [&str; 7] = ["app", "iat", "exp", "n", "typ", "ogn", "v"];

    for mask in 0u32..128 {
        let present = |bit: u32| mask & (1 << bit) != 0;
        let claims = Claims {
            app: if present(0) { "TokenApp".into() } else { String::new() },
            issued_at: if present(1) { 1_600_000_000 } else { 0 },
            expires_at: if present(2) { 1_600_086_400 } else { 0 },
            nonce: if present(3) { 42 } else { 0 },
            token_type: if present(4) { "session".into() } else { String::new() },
            origin: if present(5) { "https://example.com".into() } else { String::new() },
            ewt_version: if present(6) { "1".into() } else { String::new() },
        };

        let expected_keys: Vec<&str> = (0u32..7)
            .filter(|bit| present(*bit))
            .map(|bit| KEYS[bit as usize])
            .collect();

        let map = claims.to_map();
        let map_keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(map_keys, expected_keys, "mask {mask:#09b}");

        // The serde wire form always equals the projection.
        assert_eq!(
            serde_json::to_value(&claims).unwrap(),
            serde_json::Value::Object(claims.to_map()),
            "mask {mask:#09b}"
        );

        if mask == 0 {
            assert!(matches!(claims.typed_data(), Err(EwtError::EmptyClaims)));
            continue;
        }

        let td = claims.typed_data().unwrap();
        let schema_keys: Vec<&str> = td.types["Claims"]
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(schema_keys, expected_keys, "mask {mask:#09b}");

        // Every non-empty combination digests deterministically.
        let d1 = td.encode_digest().unwrap();
        let d2 = claims.typed_data().unwrap().encode_digest().unwrap();
        assert_eq!(d1, d2, "mask {mask:#09b}");
    }
}

#[test]
fn test_field_presence_is_part_of_the_contract() {
    // Adding a field changes the type string, so it changes the digest
    // even though all shared values are identical.
    let with_type = full_claims();
    let mut without_type = full_claims();
    without_type.token_type = String::new();

    let d_with = with_type.typed_data().unwrap().encode_digest().unwrap();
    let d_without = without_type.typed_data().unwrap().encode_digest().unwrap();
    assert_ne!(d_with, d_without);

    // And the schema itself differs, not just the values.
    assert_ne!(
        with_type.typed_data().unwrap().encode_type("Claims").unwrap(),
        without_type
            .typed_data()
            .unwrap()
            .encode_type("Claims")
            .unwrap()
    );
}

// ---------------------------------------------------------------------------
// Wire-parsed claims digest identically to locally-built claims
// ---------------------------------------------------------------------------

#[test]
fn test_wire_parsed_claims_reproduce_the_digest() {
    let issued = full_claims();
    let wire = serde_json::to_string(&issued).unwrap();

    let verified: Claims = serde_json::from_str(&wire).unwrap();
    assert_eq!(issued, verified);
    assert_eq!(
        issued.typed_data().unwrap().encode_digest().unwrap(),
        verified.typed_data().unwrap().encode_digest().unwrap()
    );
}

// ---------------------------------------------------------------------------
// Validity windows against a fixed clock
// ---------------------------------------------------------------------------

#[test]
fn test_validity_window_contract() {
    const NOW: i64 = 1_700_000_000;
    let base = Claims {
        app: "TokenApp".to_string(),
        issued_at: NOW,
        expires_at: NOW + 3600,
        ewt_version: "1".to_string(),
        ..Default::default()
    };

    let at = |issued_at: i64, expires_at: i64| {
        Claims {
            issued_at,
            expires_at,
            ..base.clone()
        }
        .validate_at(NOW)
    };

    // Issuance accepted up to DRIFT_SECS in the future.
    assert_eq!(at(NOW + DRIFT_SECS, NOW + 3600), Ok(()));
    assert_eq!(
        at(NOW + DRIFT_SECS + 1, NOW + 3600),
        Err(ValidationError::InvalidIssuedAt)
    );

    // Expiry tolerated up to DRIFT_SECS in the past.
    assert_eq!(at(NOW, NOW - DRIFT_SECS), Ok(()));
    assert_eq!(at(NOW, NOW - DRIFT_SECS + 1), Ok(()));
    assert_eq!(
        at(NOW, NOW - DRIFT_SECS - 1),
        Err(ValidationError::Expired)
    );

    // Both windows are capped at a year plus drift.
    assert_eq!(at(NOW - MAX_VALIDITY_SECS, NOW + 3600), Ok(()));
    assert_eq!(
        at(NOW - MAX_VALIDITY_SECS - 1, NOW + 3600),
        Err(ValidationError::InvalidIssuedAt)
    );
    assert_eq!(at(NOW, NOW + MAX_VALIDITY_SECS), Ok(()));
    assert_eq!(
        at(NOW, NOW + MAX_VALIDITY_SECS + 1),
        Err(ValidationError::Expired)
    );
}

#[test]
fn test_error_messages_are_stable() {
    // Error text is part of the API surface; downstream code matches on it.
    assert_eq!(ValidationError::EmptyVersion.to_string(), "ewt version is empty");
    assert_eq!(ValidationError::EmptyApp.to_string(), "app is empty");
    assert_eq!(ValidationError::InvalidIssuedAt.to_string(), "iat is invalid");
    assert_eq!(ValidationError::Expired.to_string(), "token has expired");
    assert_eq!(EwtError::EmptyClaims.to_string(), "claims are empty");
    assert_eq!(
        EwtError::InvalidClaims(ValidationError::EmptyApp).to_string(),
        "claims are invalid: app is empty"
    );
}

// ---------------------------------------------------------------------------
// Token lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_token_issue_and_verify_walkthrough() {
    // Issuer side: fresh token, fill in claims, derive the signing digest.
    let mut token = Token::new();
    token.address = "0x9e8a2b7c1d3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b".to_string();
    token.claims.app = "TokenApp".to_string();
    token.claims.origin = "https://example.com".to_string();
    token.claims.set_issued_at_now();
    token.claims.set_expiry_in(Duration::hours(1));

    let digest = token.message_digest().unwrap();
    assert_eq!(digest.to_hex().len(), 64);

    // The signature over the digest would be produced externally.
    token.signature = "0xdeadbeef".to_string();

    // Verifier side: recompute the digest from the received claims and
    // get bit-identical bytes.
    let received: Token = serde_json::from_str(&serde_json::to_string(&token).unwrap()).unwrap();
    assert_eq!(received.message_digest().unwrap(), digest);

    // Any claims tampering shifts the digest.
    let mut tampered = received;
    tampered.claims.nonce = 99;
    assert_ne!(tampered.message_digest().unwrap(), digest);

    // The domain every implementation must use.
    assert_eq!(eip712_domain().name.as_deref(), Some("ETHWebToken"));
}
