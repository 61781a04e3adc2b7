//! User profile and administration handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use instar_core::UserId;
use instar_platform_access::User;
use instar_platform_access::api::{BanUpdate, RoleUpdate, UserProfile};
use tracing::info;

use crate::auth::{AppState, RequireAdmin, RequireAuth};
use crate::error::ApiError;

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::from_str(raw).map_err(|e| ApiError::BadRequest {
        message: e.to_string(),
    })
}

async fn load_user(state: &AppState, id: UserId) -> Result<User, ApiError> {
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: format!("user '{id}'"),
        })
}

async fn save_user(state: &AppState, user: &User) -> Result<(), ApiError> {
    if state.store.update(user).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound {
            resource: format!("user '{}'", user.id()),
        })
    }
}

/// Lists every user.
pub async fn list_users(
    RequireAdmin(_): RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = state.store.list().await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

/// Fetches one user's profile. Any signed-in user may call this.
pub async fn get_user(
    RequireAuth(_): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = load_user(&state, parse_user_id(&id)?).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// Changes a user's role.
pub async fn update_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<RoleUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let mut user = load_user(&state, parse_user_id(&id)?).await?;
    user.set_role(update.role);
    save_user(&state, &user).await?;

    info!(admin_id = %admin.sub, user_id = %user.id(), role = %update.role, "changed user role");
    Ok(Json(UserProfile::from(&user)))
}

/// Bans or unbans a user.
pub async fn update_ban(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<BanUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let mut user = load_user(&state, parse_user_id(&id)?).await?;
    user.set_banned(update.banned);
    save_user(&state, &user).await?;

    info!(admin_id = %admin.sub, user_id = %user.id(), banned = update.banned, "changed ban flag");
    Ok(Json(UserProfile::from(&user)))
}

/// Deletes a user.
pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_user_id(&id)?;
    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound {
            resource: format!("user '{id}'"),
        });
    }

    info!(admin_id = %admin.sub, user_id = %id, "deleted user");
    Ok(StatusCode::NO_CONTENT)
}
