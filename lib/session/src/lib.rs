//! Client-side session handling for the Instar dashboard.
//!
//! This crate provides:
//! - Persistence of the session record (`TokenStore`)
//! - The shared `SessionState`
//! - The liveness monitor that refreshes or expires the access token
//! - The route guard and a guard-aware `Navigator`
//! - An HTTP client for the dashboard API

pub mod client;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod monitor;
pub mod state;
pub mod store;

pub use client::{HttpApiClient, RefreshApi};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, LivenessConfig};
pub use dashboard::Dashboard;
pub use error::ClientError;
pub use guard::{Access, Decision, Navigation, Navigator, RouteGuard, RouteTable, decide};
pub use monitor::{LivenessMonitor, MonitorHandle, TickAction, evaluate};
pub use state::{SessionState, SharedSession};
pub use store::{FileTokenStore, MemoryTokenStore, PersistedSession, TokenStore};
