// src/models/stats.rs

use serde::Serialize;

/// Headline counts for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_authors: i64,
    pub total_published_tests: i64,
}
