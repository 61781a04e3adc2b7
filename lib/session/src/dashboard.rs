//! The assembled dashboard client.

use std::sync::Arc;

use instar_platform_access::api::UserProfile;
use rootcause::Report;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::client::HttpApiClient;
use crate::clock::{Clock, SystemClock};
use crate::config::{ClientConfig, LivenessConfig};
use crate::error::ClientError;
use crate::guard::{Decision, RouteGuard};
use crate::monitor::{LivenessMonitor, MonitorHandle};
use crate::state::{SessionState, SharedSession};
use crate::store::{FileTokenStore, TokenStore};

/// Session state, API client, route guard and liveness monitor for one
/// running dashboard.
#[derive(Debug)]
pub struct Dashboard {
    session: SharedSession,
    api: Arc<HttpApiClient>,
    guard: RouteGuard,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl Dashboard {
    /// Rehydrates the session from disk and starts the liveness monitor.
    pub fn start(config: &ClientConfig) -> Result<Self, Report<ClientError>> {
        let api = Arc::new(HttpApiClient::new(config.api_base_url.clone())?);
        let store = Box::new(FileTokenStore::new(config.token_store_path.clone()));
        Self::with_parts(
            store,
            api,
            Arc::new(SystemClock),
            RouteGuard::default(),
            config.liveness.clone(),
        )
    }

    /// Assembles a dashboard from explicit parts and starts its monitor.
    pub fn with_parts(
        store: Box<dyn TokenStore>,
        api: Arc<HttpApiClient>,
        clock: Arc<dyn Clock>,
        guard: RouteGuard,
        liveness: LivenessConfig,
    ) -> Result<Self, Report<ClientError>> {
        let session = SessionState::rehydrate(store)?.into_shared();
        let monitor = LivenessMonitor::new(session.clone(), api.clone(), clock, liveness).spawn();
        Ok(Self {
            session,
            api,
            guard,
            monitor: Mutex::new(Some(monitor)),
        })
    }

    #[must_use]
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    #[must_use]
    pub fn api(&self) -> &HttpApiClient {
        &self.api
    }

    /// Signs in and caches the issued tokens.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), Report<ClientError>> {
        let response = self.api.login(email, password).await?;
        self.session.lock().await.sign_in(response)
    }

    /// Signs out and clears the persisted session.
    pub async fn logout(&self) -> Result<(), Report<ClientError>> {
        self.session.lock().await.sign_out()
    }

    /// Route check against the current session.
    pub async fn check(&self, path: &str) -> Decision {
        let session = self.session.lock().await;
        self.guard.check(session.is_authenticated(), session.role(), path)
    }

    /// Fetches and caches the signed-in user's profile.
    ///
    /// Failures are logged and leave the cached profile as it was.
    pub async fn load_profile(&self) -> Option<UserProfile> {
        let (user_id, access_token) = {
            let session = self.session.lock().await;
            match (session.user_id(), session.access_token()) {
                (Some(user_id), Some(token)) => (user_id, token.to_string()),
                _ => return None,
            }
        };

        match self.api.fetch_profile(user_id, &access_token).await {
            Ok(profile) => {
                self.session.lock().await.set_profile(profile.clone());
                Some(profile)
            }
            Err(report) => {
                warn!(user_id = %user_id, error = %report, "failed to load profile");
                None
            }
        }
    }

    /// Stops the liveness monitor.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.monitor.lock().await.take() {
            handle.shutdown().await;
            info!("dashboard client stopped");
        }
    }
}
