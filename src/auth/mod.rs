pub mod password;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;

pub use password::{
    generate_random_password, generate_token, hash_password, validate_password_strength, verify_password,
    PasswordStrength,
};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("{0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer/verifier built once from [`JwtConfig`].
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(config: &JwtConfig) -> AuthResult<Self> {
        Self::new(&config.secret, config.expires_in, config.refresh_expires_in)
    }

    pub fn create_access_token(&self, user_id: Uuid, email: &str) -> AuthResult<String> {
        self.sign(user_id, email, self.access_ttl)
    }

    pub fn create_refresh_token(&self, user_id: Uuid, email: &str) -> AuthResult<String> {
        self.sign(user_id, email, self.refresh_ttl)
    }

    fn sign(&self, user_id: Uuid, email: &str, ttl: Duration) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Read claims without checking the signature or expiry. Never use the
/// result for authorization.
pub fn decode_unverified(token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

/// Undecodable tokens count as expired.
pub fn is_expired(token: &str) -> bool {
    decode_unverified(token)
        .map(|claims| claims.exp < Utc::now().timestamp())
        .unwrap_or(true)
}

pub fn expiration(token: &str) -> Option<DateTime<Utc>> {
    decode_unverified(token).and_then(|claims| Utc.timestamp_opt(claims.exp, 0).single())
}

/// Token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}
