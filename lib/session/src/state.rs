//! The client's session state.
//!
//! One `SessionState` exists per client process. It is rehydrated from the
//! token store at startup, mutated by login, refresh, expiry and logout,
//! and writes every token change through to the store.

use std::sync::Arc;

use instar_core::UserId;
use instar_platform_access::Role;
use instar_platform_access::api::{LoginResponse, UserProfile};
use instar_core::Result;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::store::{PersistedSession, TokenStore};

/// Session state shared between the UI side and the liveness monitor.
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Authentication flag, identity and cached tokens of the current user.
pub struct SessionState {
    authenticated: bool,
    role: Option<Role>,
    user_id: Option<UserId>,
    profile: Option<UserProfile>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    store: Box<dyn TokenStore>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("authenticated", &self.authenticated)
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionState {
    /// Builds the state from whatever the store holds.
    ///
    /// A stored access token marks the session authenticated; the liveness
    /// monitor decides on its first tick whether that token is still usable.
    pub fn rehydrate(store: Box<dyn TokenStore>) -> Result<Self, ClientError> {
        let persisted = store.load()?;
        let authenticated = persisted.access_token.is_some();
        debug!(authenticated, role = ?persisted.role, "rehydrated session");

        Ok(Self {
            authenticated,
            role: persisted.role,
            user_id: persisted.user_id,
            profile: None,
            access_token: persisted.access_token,
            refresh_token: persisted.refresh_token,
            store,
        })
    }

    /// Wraps the state for sharing with the monitor.
    #[must_use]
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Records a successful login.
    ///
    /// Nothing changes in memory unless the record was saved.
    pub fn sign_in(&mut self, login: LoginResponse) -> Result<(), ClientError> {
        self.store.save(&PersistedSession {
            access_token: Some(login.access_token.clone()),
            refresh_token: Some(login.refresh_token.clone()),
            role: Some(login.role),
            user_id: Some(login.user_id),
        })?;

        info!(user_id = %login.user_id, role = %login.role, "signed in");
        self.authenticated = true;
        self.role = Some(login.role);
        self.user_id = Some(login.user_id);
        self.profile = None;
        self.access_token = Some(login.access_token);
        self.refresh_token = Some(login.refresh_token);
        Ok(())
    }

    /// Stores the profile fetched for the current user.
    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
    }

    /// Overwrites the cached access token after a refresh.
    pub fn replace_access_token(&mut self, token: String) -> Result<(), ClientError> {
        self.store.save(&PersistedSession {
            access_token: Some(token.clone()),
            ..self.record()
        })?;
        self.access_token = Some(token);
        Ok(())
    }

    /// Drops the authentication flag without touching tokens.
    pub fn mark_signed_out(&mut self) {
        self.authenticated = false;
    }

    /// Terminal expiry: both tokens are discarded.
    ///
    /// Role and user id stay in the store so the login form can be
    /// prefilled; they grant nothing without tokens.
    pub fn expire(&mut self) -> Result<(), ClientError> {
        self.authenticated = false;
        self.access_token = None;
        self.refresh_token = None;
        self.store.save(&self.record())
    }

    /// Logout: forget everything, in memory and on disk.
    pub fn sign_out(&mut self) -> Result<(), ClientError> {
        info!(user_id = ?self.user_id, "signed out");
        self.authenticated = false;
        self.role = None;
        self.user_id = None;
        self.profile = None;
        self.access_token = None;
        self.refresh_token = None;
        self.store.clear()
    }

    fn record(&self) -> PersistedSession {
        PersistedSession {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            role: self.role,
            user_id: self.user_id,
        }
    }
}
