//! Bearer assertion integration tests, cross-checked with `jsonwebtoken`.

mod common;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Duration;
use common::{TestApp, TEST_AUDIENCE, TEST_ISSUER, TEST_SECRET};
use identity_service::services::{Claims, ServiceError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

fn jwt_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TEST_ISSUER]);
    validation.set_audience(&[TEST_AUDIENCE]);
    validation
}

#[test]
fn assertion_verifies_with_a_standard_jwt_library() {
    let app = TestApp::new();
    let token = app
        .state
        .assertions
        .issue("client_key123", "user-42")
        .expect("assertion issued");

    let decoded = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(TEST_SECRET.as_bytes()),
        &jwt_validation(),
    )
    .expect("signature verifies");

    assert_eq!(decoded.header.alg, Algorithm::HS256);
    assert_eq!(decoded.header.typ.as_deref(), Some("JWT"));
    assert_eq!(decoded.claims.sub, "user-42");
    assert_eq!(decoded.claims.exp - decoded.claims.iat, 86400);
    assert!(decoded.claims.data.is_none());
}

#[test]
fn assertions_at_different_instants_differ_but_both_verify() {
    let app = TestApp::new();
    let issuer = &app.state.assertions;

    let first = issuer.issue("client_key123", "user-42").unwrap();
    app.clock.advance(Duration::seconds(30));
    let second = issuer.issue("client_key123", "user-42").unwrap();
    assert_ne!(first, second);

    let a = issuer.verify(&first).expect("first verifies");
    let b = issuer.verify(&second).expect("second verifies");
    assert_eq!(b.iat - a.iat, 30);
    assert_eq!(b.exp - a.exp, 30);
    assert_ne!(a.jti, b.jti);
}

#[test]
fn tampering_with_any_payload_byte_invalidates_the_signature() {
    let app = TestApp::new();
    let issuer = &app.state.assertions;
    let token = issuer
        .issue_at("client_key123", "user-42", 1_700_000_000, "fixed-jti")
        .unwrap();

    let parts: Vec<&str> = token.split('.').collect();
    let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();

    for i in 0..payload.len() {
        let mut forged = payload.clone();
        forged[i] ^= 0x01;
        let forged_token = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(&forged),
            parts[2]
        );
        let err = issuer.verify(&forged_token).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidAssertion(_)), "byte {}", i);
    }
}

#[test]
fn tampered_signature_is_rejected_by_jsonwebtoken_too() {
    let app = TestApp::new();
    let token = app.state.assertions.issue("client_key123", "user-42").unwrap();
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let mut sig = URL_SAFE_NO_PAD.decode(signature).unwrap();
    sig[0] ^= 0xff;
    let forged = format!("{}.{}", signed, URL_SAFE_NO_PAD.encode(sig));

    let result = decode::<Claims>(
        &forged,
        &DecodingKey::from_secret(TEST_SECRET.as_bytes()),
        &jwt_validation(),
    );
    assert!(result.is_err());
}

#[test]
fn issue_at_produces_fixed_claims() {
    let app = TestApp::new();
    let token = app
        .state
        .assertions
        .issue_at("client_key123", "user-42", 1_700_000_000, "fixed-jti")
        .unwrap();
    let claims = app.state.assertions.verify(&token).unwrap();

    assert_eq!(
        claims,
        Claims {
            iss: TEST_ISSUER.to_string(),
            sub: "user-42".to_string(),
            aud: TEST_AUDIENCE.to_string(),
            iat: 1_700_000_000,
            exp: 1_700_086_400,
            jti: "fixed-jti".to_string(),
            data: None,
        }
    );
}
