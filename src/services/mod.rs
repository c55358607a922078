// src/services/mod.rs

pub mod auth;
pub mod catalog;
pub mod results;
pub mod stats;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use results::ResultService;
pub use stats::StatsService;
