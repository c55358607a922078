// src/lib.rs

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;

pub use error::ServiceError;
pub use state::AppState;
