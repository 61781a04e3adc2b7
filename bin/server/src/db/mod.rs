//! User persistence for the dashboard server.
//!
//! Handlers talk to a [`UserStore`]; the server picks the PostgreSQL
//! implementation when a database URL is configured and the in-memory one
//! otherwise.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use instar_core::UserId;
use instar_platform_access::User;
use rootcause::Report;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Errors from the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another account already uses this email.
    Conflict { email: String },
    /// The backing database failed.
    Database { details: String },
    /// A stored row could not be turned back into a user.
    Corrupt { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { email } => write!(f, "email '{email}' is already registered"),
            Self::Database { details } => write!(f, "user database error: {details}"),
            Self::Corrupt { details } => write!(f, "corrupt user record: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Credential store: users keyed by id, unique by email.
///
/// Email lookups are case-insensitive.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Report<StoreError>>;

    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<User>, Report<StoreError>>;

    /// Inserts a new user; `Conflict` if the email is taken.
    async fn create(&self, user: &User) -> Result<(), Report<StoreError>>;

    /// Writes back role, ban flag and profile fields. Returns false if the
    /// user does not exist.
    async fn update(&self, user: &User) -> Result<bool, Report<StoreError>>;

    /// Returns false if the user did not exist.
    async fn delete(&self, id: UserId) -> Result<bool, Report<StoreError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_display_names_email() {
        let err = StoreError::Conflict {
            email: "a@example.com".to_string(),
        };
        assert_eq!(err.to_string(), "email 'a@example.com' is already registered");
    }
}
