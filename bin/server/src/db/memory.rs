//! In-memory user store, used when no database is configured and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use instar_core::UserId;
use instar_platform_access::User;
use rootcause::Report;
use tokio::sync::RwLock;

use super::{StoreError, UserStore};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Report<StoreError>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email().eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, Report<StoreError>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at(), u.id()));
        Ok(users)
    }

    async fn create(&self, user: &User) -> Result<(), Report<StoreError>> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email().eq_ignore_ascii_case(user.email()))
        {
            return Err(StoreError::Conflict {
                email: user.email().to_string(),
            }
            .into());
        }
        users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, Report<StoreError>> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id()) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, Report<StoreError>> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
