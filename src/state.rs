// src/state.rs

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::Config,
    db,
    error::ServiceError,
    security::{Argon2Verifier, JwtIssuer, PasswordVerifier, TokenIssuer},
    services::{AuthService, CatalogService, ResultService, StatsService},
    store::{DataStore, postgres::PgStore},
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("admin bootstrap failed: {0}")]
    AdminBootstrap(#[from] ServiceError),
}

/// The four services, sharing one store handle.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub stats: StatsService,
    pub catalog: CatalogService,
    pub results: ResultService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        passwords: Arc<dyn PasswordVerifier>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            auth: AuthService::new(store.clone(), passwords, tokens),
            stats: StatsService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            results: ResultService::new(store),
        }
    }

    /// Connects to Postgres, wires the production collaborators and seeds
    /// the configured admin account.
    ///
    /// This is what the embedding binary calls after `Config::from_env` and
    /// `telemetry::init_tracing`.
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let pool = db::connect(config).await?;

        let state = Self::new(
            Arc::new(PgStore::new(pool)),
            Arc::new(Argon2Verifier),
            Arc::new(JwtIssuer::new(&config.jwt_secret)),
        );
        state.bootstrap_admin(config).await?;

        Ok(state)
    }

    /// Seeds the admin account from config, if one is configured.
    pub async fn bootstrap_admin(&self, config: &Config) -> Result<(), ServiceError> {
        if let Some(admin) = &config.admin {
            self.auth
                .ensure_admin(&admin.name, &admin.email, &admin.password)
                .await?;
        }
        Ok(())
    }
}
