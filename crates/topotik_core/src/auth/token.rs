//! HMAC-signed access tokens.
//!
//! # Invariants
//! - Tokens carry `sub` (user id), `iat` and `exp` in Unix seconds.
//! - Expiry is checked with zero leeway.
//! - Only HMAC algorithms are accepted.

use crate::model::user::UserId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub const TOKEN_TYPE: &str = "bearer";

/// Verification or signing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// `exp` is in the past.
    Expired,
    /// Token structure, encoding or claims are invalid.
    Malformed,
    /// Signature does not match the configured key and algorithm.
    SignatureMismatch,
    /// Token could not be produced.
    Signing(String),
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "token expired"),
            Self::Malformed => write!(f, "token malformed"),
            Self::SignatureMismatch => write!(f, "token signature mismatch"),
            Self::Signing(message) => write!(f, "token signing failed: {message}"),
        }
    }
}

impl Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::SignatureMismatch,
            _ => Self::Malformed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: u64,
    exp: u64,
}

/// Issued token plus its expiry.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignedToken {
    pub access_token: String,
    pub token_type: &'static str,
    /// Unix seconds.
    pub expires_at: u64,
}

impl Debug for SignedToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Signs and verifies tokens with one shared secret.
pub struct TokenSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl TokenSigner {
    /// Returns `None` when `algorithm` is not an HMAC variant.
    pub fn new(secret: &[u8], algorithm: Algorithm, ttl_minutes: u64) -> Option<Self> {
        if !is_hmac(algorithm) {
            return None;
        }
        Some(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs: ttl_minutes.saturating_mul(60),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn issue(&self, user_id: UserId) -> Result<SignedToken, TokenError> {
        self.issue_at(user_id, now_secs())
    }

    /// Issues a token as if signed at `issued_at` (Unix seconds).
    pub fn issue_at(&self, user_id: UserId, issued_at: u64) -> Result<SignedToken, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
        };
        let access_token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))?;
        Ok(SignedToken {
            access_token,
            token_type: TOKEN_TYPE,
            expires_at: claims.exp,
        })
    }

    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Malformed)
    }
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
