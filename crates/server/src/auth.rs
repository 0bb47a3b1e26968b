//! Token issuance and password hashing.
//!
//! Bearer tokens carry the user id and a 30-day expiry; password hashes use
//! bcrypt. The engine never sees plaintext credentials.

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ServerError;

const TOKEN_VALIDITY_DAYS: i64 = 30;

/// Keys and gates for the authentication layer.
pub struct AuthConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    admin_code: Option<String>,
}

impl AuthConfig {
    /// `admin_code`, when set, gates user registration behind the
    /// `x-admin-code` request header.
    pub fn new(secret: &str, admin_code: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            admin_code,
        }
    }
}

/// The contents of an issued token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

pub(crate) fn issue_token(user_id: Uuid, config: &AuthConfig) -> Result<String, ServerError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_VALIDITY_DAYS)).timestamp(),
    };
    encode(&Header::default(), &claims, &config.encoding_key).map_err(|err| {
        tracing::error!("failed to sign token: {err}");
        ServerError::Generic("failed to issue token".to_string())
    })
}

pub(crate) fn verify_token(token: &str, config: &AuthConfig) -> Result<Uuid, ServerError> {
    decode::<Claims>(token, &config.decoding_key, &Validation::default())
        .map(|data| data.claims.sub)
        .map_err(|_| ServerError::Unauthorized)
}

pub(crate) fn hash_password(password: &str) -> Result<String, ServerError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|err| {
        tracing::error!("failed to hash password: {err}");
        ServerError::Generic("failed to hash password".to_string())
    })
}

pub(crate) fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

/// Registration gate: when an admin code is configured the request must
/// present it in the `x-admin-code` header.
pub(crate) fn require_admin_code(
    config: &AuthConfig,
    headers: &HeaderMap,
) -> Result<(), ServerError> {
    let Some(expected) = &config.admin_code else {
        return Ok(());
    };
    let provided = headers.get("x-admin-code").and_then(|v| v.to_str().ok());
    if provided != Some(expected.as_str()) {
        return Err(ServerError::Forbidden(
            "not authorized to register users".to_string(),
        ));
    }
    Ok(())
}
