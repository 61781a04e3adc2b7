//! User domain type.
//!
//! A `User` is the credential store's record for one dashboard account:
//! contact details, the single role it holds, the ban flag and the
//! password hash used at login.

use chrono::{DateTime, Utc};
use instar_core::UserId;
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A dashboard account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal user ID.
    id: UserId,
    /// Name shown in the dashboard.
    display_name: String,
    /// Login email, unique across the store.
    email: String,
    /// Contact phone number.
    phone: String,
    /// Authorization role.
    role: Role,
    /// Banned users are denied authentication.
    banned: bool,
    /// Argon2id PHC string.
    password_hash: String,
    /// When the user record was created.
    created_at: DateTime<Utc>,
    /// When the user record was last updated.
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new, unbanned user with the `user` role.
    #[must_use]
    pub fn new(display_name: String, email: String, phone: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            display_name,
            email,
            phone,
            role: Role::User,
            banned: false,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        id: UserId,
        display_name: String,
        email: String,
        phone: String,
        role: Role,
        banned: bool,
        password_hash: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name,
            email,
            phone,
            role,
            banned,
            password_hash,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_banned(&self) -> bool {
        self.banned
    }

    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Changes the user's role.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Sets or clears the ban flag.
    pub fn set_banned(&mut self, banned: bool) {
        self.banned = banned;
        self.updated_at = Utc::now();
    }
}
