//! Authentication extractors for Axum.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;
use instar_platform_access::api::ErrorBody;
use instar_platform_access::{AuthenticationError, TokenClaims};
use tracing::debug;

use super::AppState;

/// Extractor for requiring a valid bearer access token.
///
/// Yields the verified claims; the user record is not loaded.
pub struct RequireAuth(pub TokenClaims);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthRejection::NotAuthenticated)?;

        match app_state.tokens.verify_access(bearer.token(), Utc::now()) {
            Ok(claims) => Ok(RequireAuth(claims)),
            Err(report) => {
                debug!(error = %report, "rejected access token");
                match report.current_context() {
                    AuthenticationError::TokenExpired => Err(AuthRejection::TokenExpired),
                    _ => Err(AuthRejection::InvalidToken),
                }
            }
        }
    }
}

/// Extractor for requiring an access token with the admin role.
pub struct RequireAdmin(pub TokenClaims);

impl<S> FromRequestParts<S> for RequireAdmin
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(claims) = RequireAuth::from_request_parts(parts, state).await?;

        if !claims.role.is_admin() {
            return Err(AuthRejection::AdminRequired);
        }

        Ok(RequireAdmin(claims))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    NotAuthenticated,
    InvalidToken,
    TokenExpired,
    AdminRequired,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotAuthenticated => (StatusCode::UNAUTHORIZED, "authentication required"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid access token"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "access token has expired"),
            Self::AdminRequired => (StatusCode::FORBIDDEN, "admin access required"),
        };
        let body = ErrorBody {
            error: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
