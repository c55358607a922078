// src/services/auth.rs

use std::sync::Arc;

use crate::{
    error::{BoxError, Entity, ServiceError},
    models::account::{Account, AdminSession, NewAccount, Role},
    security::{PasswordVerifier, TOKEN_TTL, TokenIssuer, TokenPayload},
    store::DataStore,
};

/// Admin login and admin bootstrap.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn DataStore>,
    passwords: Arc<dyn PasswordVerifier>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn DataStore>,
        passwords: Arc<dyn PasswordVerifier>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            store,
            passwords,
            tokens,
        }
    }

    /// Authenticates an admin and returns a one-hour session token.
    ///
    /// An unknown email and a non-admin account fail identically, so callers
    /// cannot tell which accounts exist.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AdminSession, ServiceError> {
        let account = self
            .store
            .find_account_by_email(email)
            .await
            .map_err(|e| {
                tracing::error!("Login DB error: {:?}", e);
                ServiceError::fetch_failed(Entity::Account, e)
            })?
            .filter(|account| account.role == Role::Admin)
            .ok_or_else(|| ServiceError::not_found(Entity::Account, email))?;

        let is_valid = self
            .passwords
            .verify(password, &account.password)
            .map_err(|e| {
                tracing::error!(account_id = account.id, "Stored hash rejected: {}", e);
                ServiceError::fetch_failed(Entity::Account, e)
            })?;

        if !is_valid {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(
                TokenPayload {
                    id: account.id,
                    role: account.role,
                },
                TOKEN_TTL,
            )
            .map_err(|e| {
                tracing::error!(account_id = account.id, "Failed to sign token: {}", e);
                ServiceError::fetch_failed(Entity::Account, e)
            })?;

        tracing::info!(account_id = account.id, "Admin signed in");

        Ok(AdminSession {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            token,
        })
    }

    /// Creates the configured admin account unless the email is already taken.
    /// An existing account is returned as-is, whatever its role.
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, ServiceError> {
        let create_failed = |source: BoxError| ServiceError::CreateFailed {
            entity: Entity::Account,
            source,
        };

        let existing = self
            .store
            .find_account_by_email(email)
            .await
            .map_err(|e| create_failed(e.into()))?;

        if let Some(account) = existing {
            tracing::debug!(account_id = account.id, "Admin account already present");
            return Ok(account);
        }

        tracing::info!("Seeding admin user: {}", email);

        let hashed_password = self
            .passwords
            .hash(password)
            .map_err(|e| create_failed(e.into()))?;

        let account = self
            .store
            .insert_account(&NewAccount {
                name: name.to_string(),
                email: email.to_string(),
                password: hashed_password,
                role: Role::Admin,
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to seed admin user: {:?}", e);
                create_failed(e.into())
            })?;

        tracing::info!(account_id = account.id, "Admin user created successfully.");
        Ok(account)
    }
}
