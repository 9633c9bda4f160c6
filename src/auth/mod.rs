pub mod google;
pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::User;

/// Bearer tokens are signed and checked with HS256 only.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub role: String,
    pub unidad_id: i64,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            unidad_id: user.unidad_id,
            sub: user.id.to_string(),
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT_SECRET is not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Issues and validates session tokens with the configured shared secret.
#[derive(Clone)]
pub struct TokenService {
    secret: Option<String>,
    expiry_hours: u64,
}

impl TokenService {
    pub fn new(secret: Option<String>, expiry_hours: u64) -> Self {
        let secret = secret.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self { secret, expiry_hours }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    fn secret(&self) -> Result<&[u8], TokenError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or(TokenError::MissingSecret)
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let key = EncodingKey::from_secret(self.secret()?);
        let claims = Claims::for_user(user, self.expiry_hours);

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &key).map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Rejects bad signatures, any algorithm other than HS256, and expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(self.secret()?);
        let validation = Validation::new(TOKEN_ALGORITHM);

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}
