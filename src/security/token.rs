// src/security/token.rs

use std::time::Duration;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::{SecurityError, TokenIssuer, TokenPayload};
use crate::models::account::Role;

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Account id.
    pub id: i64,
    pub role: Role,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiration time as Unix timestamp.
    pub exp: i64,
}

/// HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, payload: TokenPayload, ttl: Duration) -> Result<String, SecurityError> {
        let ttl = i64::try_from(ttl.as_secs()).map_err(|e| SecurityError::Signing(e.to_string()))?;
        let issued_at = chrono::Utc::now().timestamp();

        let claims = Claims {
            id: payload.id,
            role: payload.role,
            iat: issued_at,
            exp: issued_at + ttl,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| SecurityError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<Claims, SecurityError> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| SecurityError::InvalidToken)?;

        Ok(token_data.claims)
    }
}
