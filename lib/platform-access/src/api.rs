//! JSON bodies exchanged between the dashboard server and its clients.
//!
//! Field names are camelCase on the wire.

use instar_core::UserId;
use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::user::User;

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
    pub user_id: UserId,
}

/// Body of `POST /api/refreshtoken`.
///
/// A missing field deserializes to an empty string so the handler can
/// answer 400 rather than a generic body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Body of `POST /api/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
}

/// Public view of a user; never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub banned: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            display_name: user.display_name().to_string(),
            email: user.email().to_string(),
            phone: user.phone().to_string(),
            role: user.role(),
            banned: user.is_banned(),
        }
    }
}

/// Body of `PATCH /api/users/:id/role`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

/// Body of `PATCH /api/users/:id/ban`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanUpdate {
    #[serde(default = "default_banned")]
    pub banned: bool,
}

fn default_banned() -> bool {
    true
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
