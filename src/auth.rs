//! Token identity: HS256-signed claims plus the `AuthUser` extractor.
//!
//! Tokens are issued at registration and login and carried by clients as
//! `Authorization: Bearer <token>`. Handlers that need a caller take
//! `AuthUser` as a parameter; extraction failure rejects with 401 before
//! the handler body runs.

use crate::{errors::AppError, state::AppState};
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by every issued token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: String,
    pub exp: usize,
}

const TOKEN_TTL_HOURS: i64 = 1;

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for the given account, valid for one hour.
    pub fn issue(&self, user_id: i64, role: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
        let claims = Claims {
            user_id,
            role: role.to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verify a token and return its claims. Expiry is checked by default.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

/// Authenticated caller, extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header."))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'.")
        })?;

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token."));
        }

        let claims = state
            .tokens
            .verify(token)
            .map_err(|_| AppError::unauthorized("Invalid or expired token."))?;

        Ok(Self {
            user_id: claims.user_id,
        })
    }
}
