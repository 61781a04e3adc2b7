//! Authentication routes for login, registration and token refresh.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use instar_platform_access::api::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest, UserProfile,
};
use instar_platform_access::{User, authenticate, hash_password};
use tracing::{info, warn};

use super::{AppState, normalize_email};
use crate::error::ApiError;

/// Checks credentials and issues an access/refresh token pair.
///
/// Unknown email and wrong password get the same answer and cost the same
/// hashing work. A banned account is refused only after its password checks
/// out.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = normalize_email(&request.email);
    let account = state.store.find_by_email(&email).await?;
    let user = authenticate(account.as_ref(), &request.password).inspect_err(|report| {
        warn!(user_id = ?account.as_ref().map(User::id), error = %report, "login refused");
    })?;

    let pair = state.tokens.issue_pair(user.id(), user.role(), Utc::now())?;
    info!(user_id = %user.id(), role = %user.role(), "user logged in");

    Ok(Json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        role: user.role(),
        user_id: user.id(),
    }))
}

/// Creates a new account holding the `user` role.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let email = normalize_email(&request.email);
    let display_name = request.display_name.trim().to_string();

    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest {
            message: "a valid email is required".to_string(),
        });
    }
    if display_name.is_empty() {
        return Err(ApiError::BadRequest {
            message: "display name is required".to_string(),
        });
    }
    if request.password.is_empty() {
        return Err(ApiError::BadRequest {
            message: "password is required".to_string(),
        });
    }

    let password_hash = hash_password(&request.password)?;
    let user = User::new(display_name, email, request.phone.trim().to_string(), password_hash);
    state.store.create(&user).await?;
    info!(user_id = %user.id(), "registered user");

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// Exchanges a refresh token for a new access token.
///
/// The new token keeps the role carried by the refresh token, so a role
/// change only reaches the user at their next login. The subject must
/// still exist and must not be banned. An unreadable body is a 400.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest {
        message: rejection.body_text(),
    })?;
    if request.refresh_token.trim().is_empty() {
        return Err(ApiError::BadRequest {
            message: "refresh token is required".to_string(),
        });
    }

    let now = Utc::now();
    let claims = state.tokens.verify_refresh(&request.refresh_token, now)?;

    match state.store.find_by_id(claims.sub).await? {
        Some(user) if !user.is_banned() => {}
        Some(_) => {
            warn!(user_id = %claims.sub, "refresh refused for banned user");
            return Err(ApiError::InvalidRefreshToken);
        }
        None => {
            info!(user_id = %claims.sub, "refresh for deleted user");
            return Err(ApiError::InvalidRefreshToken);
        }
    }

    let access_token = state.tokens.issue_access(claims.sub, claims.role, now)?;
    Ok(Json(RefreshResponse { access_token }))
}
