//! Compact HMAC-signed bearer assertions (`header.claims.signature`).
//!
//! Token assembly is split into three pure steps, [`encode_header`],
//! [`encode_claims`] and [`sign`], which [`AssertionIssuer`] composes with the
//! clock and a fresh `jti`.

use std::str::FromStr;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use uuid::Uuid;

use super::clock::Clock;
use super::error::ServiceError;
use crate::config::AssertionConfig;

/// HMAC variants accepted for `JWT_ALGO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl SigningAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
            SigningAlgorithm::HS384 => "HS384",
            SigningAlgorithm::HS512 => "HS512",
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(SigningAlgorithm::HS256),
            "HS384" => Ok(SigningAlgorithm::HS384),
            "HS512" => Ok(SigningAlgorithm::HS512),
            _ => Err(format!("Unsupported signing algorithm: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionHeader {
    pub alg: SigningAlgorithm,
    pub typ: String,
}

impl AssertionHeader {
    pub fn new(alg: SigningAlgorithm) -> Self {
        Self {
            alg,
            typ: "JWT".to_string(),
        }
    }
}

/// Registered claims plus an unused private-claims slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub data: Option<serde_json::Value>,
}

/// Issuer and audience a client's assertions are minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub issuer: String,
    pub audience: String,
}

pub trait ClientDirectory: Send + Sync {
    fn resolve(&self, client_id: &str) -> Option<ClientIdentity>;
}

/// Resolves every client to the same configured issuer and audience.
#[derive(Debug, Clone)]
pub struct StaticClientDirectory {
    identity: ClientIdentity,
}

impl StaticClientDirectory {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            identity: ClientIdentity {
                issuer: issuer.into(),
                audience: audience.into(),
            },
        }
    }
}

impl ClientDirectory for StaticClientDirectory {
    fn resolve(&self, _client_id: &str) -> Option<ClientIdentity> {
        Some(self.identity.clone())
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, ServiceError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| ServiceError::Signing(format!("Failed to serialize assertion: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn encode_header(header: &AssertionHeader) -> Result<String, ServiceError> {
    encode_json(header)
}

pub fn encode_claims(claims: &Claims) -> Result<String, ServiceError> {
    encode_json(claims)
}

/// What to do with a keyed MAC once the signing input has been fed in.
trait MacStep {
    type Output;

    fn run<M: Mac>(self, mac: M) -> Self::Output;
}

/// Produce the tag.
struct Tag;

impl MacStep for Tag {
    type Output = Vec<u8>;

    fn run<M: Mac>(self, mac: M) -> Vec<u8> {
        Mac::finalize(mac).into_bytes().to_vec()
    }
}

/// Compare against a presented tag in constant time.
struct Check<'a>(&'a [u8]);

impl MacStep for Check<'_> {
    type Output = bool;

    fn run<M: Mac>(self, mac: M) -> bool {
        Mac::verify_slice(mac, self.0).is_ok()
    }
}

fn keyed<M: Mac + KeyInit>(secret: &[u8], signing_input: &[u8]) -> Result<M, ServiceError> {
    let mut mac = <M as KeyInit>::new_from_slice(secret)
        .map_err(|e| ServiceError::Signing(format!("Invalid signing key: {}", e)))?;
    Mac::update(&mut mac, signing_input);
    Ok(mac)
}

fn with_mac<S: MacStep>(
    algorithm: SigningAlgorithm,
    secret: &[u8],
    signing_input: &[u8],
    step: S,
) -> Result<S::Output, ServiceError> {
    if secret.is_empty() {
        return Err(ServiceError::Configuration(
            "Signing secret is empty".to_string(),
        ));
    }
    Ok(match algorithm {
        SigningAlgorithm::HS256 => step.run(keyed::<Hmac<Sha256>>(secret, signing_input)?),
        SigningAlgorithm::HS384 => step.run(keyed::<Hmac<Sha384>>(secret, signing_input)?),
        SigningAlgorithm::HS512 => step.run(keyed::<Hmac<Sha512>>(secret, signing_input)?),
    })
}

/// HMAC over `header_b64.claims_b64`, base64url without padding.
pub fn sign(
    algorithm: SigningAlgorithm,
    secret: &[u8],
    header_b64: &str,
    claims_b64: &str,
) -> Result<String, ServiceError> {
    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let mac = with_mac(algorithm, secret, signing_input.as_bytes(), Tag)?;
    Ok(URL_SAFE_NO_PAD.encode(mac))
}

#[derive(Clone)]
pub struct AssertionIssuer {
    secret: SecretString,
    algorithm: SigningAlgorithm,
    expiry_seconds: i64,
    directory: Arc<dyn ClientDirectory>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AssertionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionIssuer")
            .field("algorithm", &self.algorithm)
            .field("expiry_seconds", &self.expiry_seconds)
            .finish_non_exhaustive()
    }
}

impl AssertionIssuer {
    /// Refuses to build an issuer around an empty secret.
    pub fn new(
        config: &AssertionConfig,
        directory: Arc<dyn ClientDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        if config.secret.expose_secret().is_empty() {
            return Err(ServiceError::Configuration(
                "JWT_SECRET must not be empty".to_string(),
            ));
        }
        if config.expiry_seconds <= 0 {
            return Err(ServiceError::Configuration(
                "JWT_EXPIRY_SECONDS must be positive".to_string(),
            ));
        }
        tracing::info!(
            algorithm = config.algorithm.as_str(),
            expiry_seconds = config.expiry_seconds,
            "Assertion issuer initialized"
        );
        Ok(Self {
            secret: config.secret.clone(),
            algorithm: config.algorithm,
            expiry_seconds: config.expiry_seconds,
            directory,
            clock,
        })
    }

    pub fn expiry_seconds(&self) -> i64 {
        self.expiry_seconds
    }

    /// Issue an assertion for `subject`, stamped with the current time.
    #[tracing::instrument(skip(self))]
    pub fn issue(&self, client_id: &str, subject: &str) -> Result<String, ServiceError> {
        let iat = self.clock.now().timestamp();
        self.issue_at(client_id, subject, iat, &Uuid::new_v4().to_string())
    }

    /// Deterministic core of [`AssertionIssuer::issue`].
    pub fn issue_at(
        &self,
        client_id: &str,
        subject: &str,
        iat: i64,
        jti: &str,
    ) -> Result<String, ServiceError> {
        let identity = self.directory.resolve(client_id).ok_or_else(|| {
            ServiceError::Configuration(format!("No issuer configured for client {}", client_id))
        })?;

        let claims = Claims {
            iss: identity.issuer,
            sub: subject.to_string(),
            aud: identity.audience,
            iat,
            exp: iat + self.expiry_seconds,
            jti: jti.to_string(),
            data: None,
        };

        let header_b64 = encode_header(&AssertionHeader::new(self.algorithm))?;
        let claims_b64 = encode_claims(&claims)?;
        let signature = sign(
            self.algorithm,
            self.secret.expose_secret().as_bytes(),
            &header_b64,
            &claims_b64,
        )?;

        Ok(format!("{}.{}.{}", header_b64, claims_b64, signature))
    }

    /// Check the signature and decode the claims. Expiry is not enforced.
    pub fn verify(&self, assertion: &str) -> Result<Claims, ServiceError> {
        let mut parts = assertion.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => {
                    return Err(ServiceError::InvalidAssertion(
                        "expected three segments".into(),
                    ))
                }
            };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| ServiceError::InvalidAssertion("malformed signature".into()))?;
        let signing_input = format!("{}.{}", header_b64, claims_b64);
        let valid = with_mac(
            self.algorithm,
            self.secret.expose_secret().as_bytes(),
            signing_input.as_bytes(),
            Check(&signature),
        )?;
        if !valid {
            return Err(ServiceError::InvalidAssertion("signature mismatch".into()));
        }

        let header: AssertionHeader = decode_segment(header_b64)?;
        if header.alg != self.algorithm {
            return Err(ServiceError::InvalidAssertion("unexpected algorithm".into()));
        }
        decode_segment(claims_b64)
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, ServiceError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| ServiceError::InvalidAssertion("malformed segment".into()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| ServiceError::InvalidAssertion("malformed segment".into()))
}
