// src/security/mod.rs

use std::time::Duration;

use thiserror::Error;

use crate::models::account::Role;

pub mod password;
pub mod token;

pub use password::Argon2Verifier;
pub use token::{Claims, JwtIssuer};

/// Lifetime of an admin session token.
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("invalid token")]
    InvalidToken,
}

/// Data embedded in a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPayload {
    pub id: i64,
    pub role: Role,
}

/// Signs and checks session tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, payload: TokenPayload, ttl: Duration) -> Result<String, SecurityError>;

    fn verify(&self, token: &str) -> Result<Claims, SecurityError>;
}

/// One-way password hashing and comparison.
pub trait PasswordVerifier: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, SecurityError>;

    /// `Ok(false)` on mismatch; `Err` only when `hash` cannot be parsed.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, SecurityError>;
}
