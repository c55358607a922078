// src/models/author.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'authors' table. Each author belongs to exactly one account.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub author_photo: Option<String>,
}
