//! Authentication module for the dashboard server.
//!
//! This module provides:
//! - Password login issuing access/refresh token pairs
//! - Self-service registration
//! - The refresh-token exchange
//! - Bearer-token extractors for Axum routes
//!
//! # Authorization Model
//!
//! Tokens carry the user's role. The extractors trust the role embedded in
//! a valid access token, and a refresh copies the role from the refresh
//! token. A role change therefore takes effect only at the user's next
//! login; until then the refresh token's lifetime (7 days by default)
//! bounds how long the old role survives. Bans are checked on every
//! refresh, so a banned user is locked out once the current access token
//! (15 minutes by default) expires.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use instar_platform_access::{Role, TokenService, User, hash_password};
use tracing::info;

use crate::config::BootstrapAdmin;
use crate::db::{StoreError, UserStore};
use crate::error::ApiError;

pub use middleware::{AuthRejection, RequireAdmin, RequireAuth};
pub use routes::{login, refresh_token, register};

/// Shared application state.
pub struct AppState {
    /// Credential store.
    pub store: Arc<dyn UserStore>,
    /// Token issuer and verifier.
    pub tokens: TokenService,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }
}

/// Emails are matched case-insensitively and stored trimmed and lowercased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the configured admin account unless its email already exists.
///
/// An existing account is left exactly as it is, including its role.
pub async fn ensure_bootstrap_admin(
    store: &dyn UserStore,
    admin: &BootstrapAdmin,
) -> Result<(), ApiError> {
    let email = normalize_email(&admin.email);
    if store.find_by_email(&email).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(&admin.password)?;
    let mut user = User::new(admin.display_name.clone(), email, String::new(), password_hash);
    user.set_role(Role::Admin);

    match store.create(&user).await {
        Ok(()) => {
            info!(user_id = %user.id(), "created bootstrap admin");
            Ok(())
        }
        // Another instance won the race.
        Err(report) if matches!(report.current_context(), StoreError::Conflict { .. }) => Ok(()),
        Err(report) => Err(report.into()),
    }
}
