//! HS256 bearer tokens.
//!
//! A token is `header.payload.signature`, each part base64url without
//! padding, signed with HMAC-SHA256 over the shared server secret.

use std::time::Duration;

use base64::prelude::*;
use catalog::Role;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id. Older tokens call this `userID`.
    #[serde(alias = "userID")]
    pub sub: String,
    /// Absent on tokens issued before roles were embedded; the role is then
    /// looked up per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, role: Option<Role>, valid_for: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: sub.into(),
            role,
            iat: now,
            exp: now.saturating_add(valid_for.as_secs() as i64),
        }
    }

    pub fn is_valid_now(&self) -> bool {
        chrono::Utc::now().timestamp() <= self.exp
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("invalid token format")]
    InvalidFormat,
    #[error("base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token parsing error: {0}")]
    Parsing(#[from] serde_json::Error),
    #[error("token has expired")]
    Expired,
    #[error("invalid signing key")]
    InvalidKey,
}

/// Issues and verifies tokens with one secret.
pub struct TokenSigner {
    secret: Vec<u8>,
    valid_for: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, valid_for: Duration) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            valid_for,
        }
    }

    pub fn valid_for(&self) -> Duration {
        self.valid_for
    }

    /// Issue a token for `user_id` carrying `role`.
    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, TokenError> {
        self.sign(&Claims::new(user_id, Some(role), self.valid_for))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = TokenHeader {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let header_segment = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let payload_segment = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{header_segment}.{payload_segment}");

        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();
        let signature_segment = BASE64_URL_SAFE_NO_PAD.encode(signature);

        Ok(format!("{signing_input}.{signature_segment}"))
    }

    /// Check format, algorithm, signature and expiry; return the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header_segment), Some(payload_segment), Some(signature_segment), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::InvalidFormat);
        };

        let header: TokenHeader =
            serde_json::from_slice(&BASE64_URL_SAFE_NO_PAD.decode(header_segment)?)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = BASE64_URL_SAFE_NO_PAD.decode(signature_segment)?;
        let signing_input = format!("{header_segment}.{payload_segment}");
        self.mac(signing_input.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims =
            serde_json::from_slice(&BASE64_URL_SAFE_NO_PAD.decode(payload_segment)?)?;
        if !claims.is_valid_now() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256, TokenError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .map_err(|_| TokenError::InvalidKey)?;
        mac.update(data);
        Ok(mac)
    }
}
