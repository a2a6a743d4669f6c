//! Stateless bearer tokens binding a request to a user identity.
//!
//! Tokens are HS256-signed JWTs carrying `{user_id, iat, exp}`. There is no
//! server-side revocation list; a token stays valid until natural expiry.
//! The claim names are a wire contract with existing clients.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Default token lifetime: one hour.
pub const DEFAULT_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates bearer tokens with a process-wide static secret,
/// injected from configuration at startup.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Produces a signed token for the given user id, expiring after the
    /// configured TTL.
    pub fn issue(&self, user_id: i64) -> ApiResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims { user_id, iat, exp: iat + self.ttl_secs };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(e.to_string()))
    }

    /// Verifies signature and expiry (zero leeway) and returns the embedded
    /// user id. The caller must still resolve the user against the
    /// credential store; a vanished user is equally `TokenInvalid`.
    pub fn validate(&self, token: &str) -> ApiResult<i64> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| ApiError::TokenInvalid)?;
        Ok(data.claims.user_id)
    }
}
