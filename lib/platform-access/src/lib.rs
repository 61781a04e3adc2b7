//! Users, roles, credentials and tokens for the Instar dashboard.
//!
//! This crate provides:
//! - The `User` record and its `Role`
//! - Argon2id password hashing and verification
//! - Stateless access/refresh token issuance, verification and refresh
//! - The JSON bodies shared by the server and the session client
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use instar_core::UserId;
//! use instar_platform_access::{Role, TokenConfig, TokenService, token};
//!
//! let tokens = TokenService::new(TokenConfig::new("a-long-and-random-signing-secret!!"))
//!     .expect("valid config");
//! let now = Utc::now();
//! let pair = tokens.issue_pair(UserId::new(), Role::Admin, now).expect("issued");
//!
//! assert!(!token::is_expired(&pair.access_token, now).expect("decodes"));
//! let fresh = tokens.refresh(&pair.refresh_token, now).expect("refreshed");
//! assert!(tokens.verify_access(&fresh, now).is_ok());
//! ```

pub mod api;
pub mod error;
pub mod password;
pub mod role;
pub mod token;
pub mod user;

// Re-export main types at crate root
pub use error::AuthenticationError;
pub use password::{authenticate, hash_password, verify_password};
pub use role::{ParseRoleError, Role};
pub use token::{TokenClaims, TokenConfig, TokenKind, TokenPair, TokenService};
pub use user::User;
