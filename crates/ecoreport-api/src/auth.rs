//! Bearer-token auth and password hashing.
//!
//! Token resolution never rejects a request: a missing, invalid or expired
//! token downgrades the caller to Guest. That is a deliberate policy, not
//! an error path; the submission flow works for everyone.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use ecoreport_core::{Error, Result, SubmittedBy, User};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

/// Tokens are valid for 24 hours; there is no refresh or revocation.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// JWT payload: enough to authorize without a user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User) -> Self {
        let now = Utc::now();
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        }
    }
}

// Signing and hashing failures are server faults, not credential
// problems; they map to the internal bucket rather than 401.
pub fn issue_token(user: &User, secret: &str) -> Result<String> {
    encode(
        &Header::default(),
        &Claims::for_user(user),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Other(anyhow::anyhow!("Failed to sign token: {e}")))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| Error::Auth(format!("Invalid token: {e}")))
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Other(anyhow::anyhow!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// The caller as seen by handlers after token resolution.
#[derive(Debug, Clone)]
pub enum Identity {
    Authenticated(AuthUser),
    Guest,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl Identity {
    pub fn submitted_by(&self) -> SubmittedBy {
        match self {
            Identity::Authenticated(user) => SubmittedBy::Authenticated(user.id),
            Identity::Guest => SubmittedBy::Guest,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Identity::Authenticated(user) => Some(user.id),
            Identity::Guest => None,
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Ok(Identity::Guest);
        };

        match decode_token(token, &state.config.jwt_secret) {
            Ok(claims) => Ok(Identity::Authenticated(AuthUser {
                id: claims.id,
                username: claims.username,
                role: claims.role,
            })),
            Err(e) => {
                warn!("{e}; continuing as guest");
                Ok(Identity::Guest)
            }
        }
    }
}
