//! Signed, time-limited session tokens (HS256 JWT).

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TTL_SECONDS: i64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct SessionTokenHeader {
    alg: String,
    typ: String,
}

impl SessionTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Identity claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Internal verification failures. The auth gate collapses all of these to
/// one generic rejection before anything reaches a caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

/// Issues and verifies session tokens.
///
/// The signing secret is immutable after construction and safe to share
/// across request tasks. Tokens are stateless: there is no revocation list,
/// so a compromised token stays valid until its expiry.
pub struct TokenService {
    secret: SecretString,
    ttl_seconds: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token for the given identity, expiring one TTL from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded or the key is
    /// unusable for HMAC.
    pub fn issue(&self, id: Uuid, name: &str) -> Result<String, Error> {
        self.issue_at(id, name, now_unix_seconds())
    }

    /// Issue with an explicit clock, for deterministic tests.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`issue`](Self::issue).
    pub fn issue_at(&self, id: Uuid, name: &str, now_unix_seconds: i64) -> Result<String, Error> {
        let header_b64 = b64e_json(&SessionTokenHeader::hs256())?;
        let claims = SessionClaims {
            sub: id,
            name: name.to_string(),
            iat: now_unix_seconds,
            exp: now_unix_seconds + self.ttl_seconds,
        };
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| Error::Key)?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a token against the current clock.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed tokens, bad signatures and expired
    /// claims; the variants are distinguishable for logging only.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, Error> {
        self.verify_at(token, now_unix_seconds())
    }

    /// Verify with an explicit clock, for deterministic tests.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`verify`](Self::verify).
    pub fn verify_at(&self, token: &str, now_unix_seconds: i64) -> Result<SessionClaims, Error> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
        if parts.next().is_some() {
            return Err(Error::TokenFormat);
        }

        let header: SessionTokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(Error::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| Error::Key)?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        // The MAC is checked before any claim is trusted; verify_slice is
        // constant-time.
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.exp <= now_unix_seconds {
            return Err(Error::Expired);
        }

        Ok(claims)
    }
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}
