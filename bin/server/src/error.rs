//! HTTP-facing error type for API handlers.
//!
//! Domain reports (`Report<StoreError>`, `Report<AuthenticationError>`)
//! convert into an [`ApiError`], which renders as a status code and an
//! `{ "error": ... }` body. Internal details are logged, never returned.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use instar_platform_access::AuthenticationError;
use instar_platform_access::api::ErrorBody;
use rootcause::Report;

use crate::db::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InvalidCredentials,
    AccountBanned,
    InvalidRefreshToken,
    Unauthorized,
    BadRequest { message: String },
    NotFound { resource: String },
    Conflict { message: String },
    Internal { details: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::AccountBanned => write!(f, "account is banned"),
            Self::InvalidRefreshToken => write!(f, "invalid refresh token"),
            Self::Unauthorized => write!(f, "authentication required"),
            Self::BadRequest { message } => write!(f, "{message}"),
            Self::NotFound { resource } => write!(f, "{resource} not found"),
            Self::Conflict { message } => write!(f, "{message}"),
            Self::Internal { details } => write!(f, "internal error: {details}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::AccountBanned
            | Self::InvalidRefreshToken
            | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message safe to show to a client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal { .. } => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { details } = &self {
            tracing::error!(error = %details, "request failed");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<Report<StoreError>> for ApiError {
    fn from(report: Report<StoreError>) -> Self {
        match report.current_context() {
            StoreError::Conflict { email } => Self::Conflict {
                message: format!("email '{email}' is already registered"),
            },
            StoreError::Database { .. } | StoreError::Corrupt { .. } => Self::Internal {
                details: report.to_string(),
            },
        }
    }
}

impl From<Report<AuthenticationError>> for ApiError {
    fn from(report: Report<AuthenticationError>) -> Self {
        match report.current_context() {
            AuthenticationError::InvalidCredentials => Self::InvalidCredentials,
            AuthenticationError::AccountBanned => Self::AccountBanned,
            AuthenticationError::InvalidRefreshToken { .. } => Self::InvalidRefreshToken,
            AuthenticationError::InvalidToken { .. } | AuthenticationError::TokenExpired => {
                Self::Unauthorized
            }
            AuthenticationError::Signing { .. } | AuthenticationError::PasswordHash { .. } => {
                Self::Internal {
                    details: report.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidRefreshToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::BadRequest {
                message: "x".to_string()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict {
                message: "x".to_string()
            }
            .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = ApiError::Internal {
            details: "connection refused to 10.0.0.5".to_string(),
        };
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn store_conflict_maps_to_409() {
        let report: Report<StoreError> = StoreError::Conflict {
            email: "a@example.com".to_string(),
        }
        .into();
        assert_eq!(ApiError::from(report).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn login_failures_keep_their_meaning() {
        let report: Report<AuthenticationError> = AuthenticationError::InvalidCredentials.into();
        assert_eq!(ApiError::from(report), ApiError::InvalidCredentials);
        let report: Report<AuthenticationError> = AuthenticationError::AccountBanned.into();
        assert_eq!(ApiError::from(report), ApiError::AccountBanned);
    }

    #[test]
    fn expired_token_maps_to_401() {
        let report: Report<AuthenticationError> = AuthenticationError::TokenExpired.into();
        assert_eq!(ApiError::from(report), ApiError::Unauthorized);
    }
}
