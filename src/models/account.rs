// src/models/account.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Platform role stored on every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "role", rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
    Author,
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,

    pub name: String,

    /// Unique login email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub role: Role,
}

/// Insert payload for a new account. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Returned by a successful admin login.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}
