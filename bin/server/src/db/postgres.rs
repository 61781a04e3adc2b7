//! PostgreSQL-backed user store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use instar_core::UserId;
use instar_platform_access::{Role, User};
use rootcause::Report;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use super::{StoreError, UserStore};

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    display_name: String,
    email: String,
    phone: String,
    role: String,
    banned: bool,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, Report<StoreError>> {
        let id = UserId::from_str(&self.id).map_err(|e| StoreError::Corrupt {
            details: format!("invalid user id '{}': {e}", self.id),
        })?;
        let role = Role::from_str(&self.role).map_err(|e| StoreError::Corrupt {
            details: format!("user '{}': {e}", self.id),
        })?;
        Ok(User::with_all_fields(
            id,
            self.display_name,
            self.email,
            self.phone,
            role,
            self.banned,
            self.password_hash,
            self.created_at,
            self.updated_at,
        ))
    }
}

fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database {
        details: e.to_string(),
    }
}

/// User store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Creates a new user store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, email, phone, role, banned, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Report<StoreError>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, email, phone, role, banned, password_hash, created_at, updated_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<User>, Report<StoreError>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, email, phone, role, banned, password_hash, created_at, updated_at
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(UserRow::try_into_user).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    async fn create(&self, user: &User) -> Result<(), Report<StoreError>> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, display_name, email, phone, role, banned, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.display_name())
        .bind(user.email())
        .bind(user.phone())
        .bind(user.role().as_str())
        .bind(user.is_banned())
        .bind(user.password_hash())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict {
                    email: user.email().to_string(),
                }
                .into())
            }
            Err(e) => Err(database_error(e).into()),
        }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    async fn update(&self, user: &User) -> Result<bool, Report<StoreError>> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET display_name = $2, phone = $3, role = $4, banned = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.display_name())
        .bind(user.phone())
        .bind(user.role().as_str())
        .bind(user.is_banned())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<bool, Report<StoreError>> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }
}
