//! Session liveness monitor.
//!
//! A single task wakes on a fixed period and inspects the cached access
//! token. Tokens close to expiry are refreshed in the background; tokens
//! past expiry end the session.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut shutdown => break,
//!         _ = interval.tick() => monitor.tick().await,
//!         Some(outcome) = results.recv() => monitor.apply_refresh(outcome).await,
//!     }
//! }
//! ```
//!
//! Refresh calls run as spawned tasks and report back over a channel, so
//! the monitor task is the only writer of refreshed tokens and the session
//! lock is never held across a network call.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use instar_platform_access::token;
use rootcause::Report;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::RefreshApi;
use crate::clock::Clock;
use crate::config::LivenessConfig;
use crate::error::ClientError;
use crate::state::SharedSession;

/// What one tick decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// A token is missing; the session is not authenticated.
    SignedOut,
    /// The access token is past its expiry (or unreadable); both tokens go.
    Expired,
    /// The access token is inside the refresh margin.
    Refresh { refresh_token: String },
    /// Nothing to do.
    Fresh,
}

/// Pure tick decision.
///
/// An access token whose expiry cannot be decoded is treated as expired:
/// it will be rejected by the server anyway and cannot be refreshed into
/// something readable.
#[must_use]
pub fn evaluate(
    access_token: Option<&str>,
    refresh_token: Option<&str>,
    now: DateTime<Utc>,
    margin: Duration,
) -> TickAction {
    let (Some(access_token), Some(refresh_token)) = (access_token, refresh_token) else {
        return TickAction::SignedOut;
    };

    let expiry = match token::expires_at(access_token) {
        Ok(expiry) => expiry,
        Err(report) => {
            debug!(error = %report, "cached access token is unreadable");
            return TickAction::Expired;
        }
    };

    if expiry <= now {
        TickAction::Expired
    } else if expiry - now < margin {
        TickAction::Refresh {
            refresh_token: refresh_token.to_string(),
        }
    } else {
        TickAction::Fresh
    }
}

/// A completed refresh call, delivered back to the monitor.
#[derive(Debug)]
pub struct RefreshOutcome {
    /// The refresh token the call was made with.
    pub refresh_token: String,
    pub result: Result<String, Report<ClientError>>,
}

/// Periodic keeper of the session's access token.
pub struct LivenessMonitor {
    session: SharedSession,
    api: Arc<dyn RefreshApi>,
    clock: Arc<dyn Clock>,
    config: LivenessConfig,
    results_tx: mpsc::UnboundedSender<RefreshOutcome>,
    results_rx: mpsc::UnboundedReceiver<RefreshOutcome>,
}

impl std::fmt::Debug for LivenessMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessMonitor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LivenessMonitor {
    #[must_use]
    pub fn new(
        session: SharedSession,
        api: Arc<dyn RefreshApi>,
        clock: Arc<dyn Clock>,
        config: LivenessConfig,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            session,
            api,
            clock,
            config,
            results_tx,
            results_rx,
        }
    }

    /// Runs one liveness check against the current session.
    ///
    /// Each tick in the refresh window starts its own refresh call, even if
    /// an earlier one has not finished yet.
    pub async fn tick(&mut self) -> TickAction {
        let now = self.clock.now();
        let mut session = self.session.lock().await;
        let action = evaluate(
            session.access_token(),
            session.refresh_token(),
            now,
            self.config.refresh_margin(),
        );

        match &action {
            TickAction::SignedOut => session.mark_signed_out(),
            TickAction::Expired => {
                info!(user_id = ?session.user_id(), "access token expired, ending session");
                if let Err(report) = session.expire() {
                    warn!(error = %report, "failed to persist expired session");
                }
            }
            TickAction::Refresh { refresh_token } => {
                debug!("access token inside refresh margin");
                self.spawn_refresh(refresh_token.clone());
            }
            TickAction::Fresh => {}
        }
        action
    }

    fn spawn_refresh(&self, refresh_token: String) {
        let api = Arc::clone(&self.api);
        let results = self.results_tx.clone();
        tokio::spawn(async move {
            let result = api.refresh(&refresh_token).await;
            // The receiver is gone once the monitor stops; late results are dropped.
            let _ = results.send(RefreshOutcome {
                refresh_token,
                result,
            });
        });
    }

    /// Applies a completed refresh to the session.
    ///
    /// A result is discarded if the session no longer holds the refresh
    /// token it was requested with (logout or expiry happened meanwhile).
    /// Failures are logged and leave the session untouched; the session only
    /// ends when the access token itself expires.
    pub async fn apply_refresh(&mut self, outcome: RefreshOutcome) {
        let mut session = self.session.lock().await;
        if session.refresh_token() != Some(outcome.refresh_token.as_str()) {
            debug!("discarding refresh result for a replaced session");
            return;
        }

        match outcome.result {
            Ok(access_token) => {
                if let Err(report) = session.replace_access_token(access_token) {
                    warn!(error = %report, "failed to persist refreshed access token");
                } else {
                    debug!(user_id = ?session.user_id(), "access token refreshed");
                }
            }
            Err(report) => {
                warn!(error = %report, "token refresh failed");
            }
        }
    }

    /// Waits for the next refresh result and applies it.
    ///
    /// Returns false if no result can arrive.
    pub async fn process_next_refresh(&mut self) -> bool {
        match self.results_rx.recv().await {
            Some(outcome) => {
                self.apply_refresh(outcome).await;
                true
            }
            None => false,
        }
    }

    /// Moves the monitor onto its own task.
    ///
    /// The first tick fires one period after spawning.
    #[must_use]
    pub fn spawn(mut self) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = self.config.poll_interval();

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(period_secs = period.as_secs(), "liveness monitor started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                    Some(outcome) = self.results_rx.recv() => {
                        self.apply_refresh(outcome).await;
                    }
                }
            }
            debug!("liveness monitor stopped");
        });

        MonitorHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Owner of a running monitor; dropping it stops the monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stops the monitor and waits for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "liveness monitor task failed");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
