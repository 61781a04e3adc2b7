//! Error types for the platform-access crate.
//!
//! Functions in this crate return `Report<AuthenticationError>`; callers add
//! their own context as the report propagates.

use std::fmt;

/// Errors from credential checks and token operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Unknown account or wrong password.
    InvalidCredentials,
    /// The account exists but has been banned by an administrator.
    AccountBanned,
    /// Token is malformed, has a bad signature, or is of the wrong kind.
    InvalidToken { reason: String },
    /// Token was well formed but its expiry has passed.
    TokenExpired,
    /// Refresh token was rejected; the client must log in again.
    InvalidRefreshToken { reason: String },
    /// Token could not be signed.
    Signing { reason: String },
    /// Password hash could not be produced or parsed.
    PasswordHash { reason: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::AccountBanned => write!(f, "account is banned"),
            Self::InvalidToken { reason } => write!(f, "invalid token: {reason}"),
            Self::TokenExpired => write!(f, "token has expired"),
            Self::InvalidRefreshToken { reason } => {
                write!(f, "invalid refresh token: {reason}")
            }
            Self::Signing { reason } => write!(f, "failed to sign token: {reason}"),
            Self::PasswordHash { reason } => write!(f, "password hash error: {reason}"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_token_display_carries_reason() {
        let err = AuthenticationError::InvalidToken {
            reason: "signature mismatch".to_string(),
        };
        assert!(err.to_string().contains("invalid token"));
        assert!(err.to_string().contains("signature mismatch"));
    }

    #[test]
    fn refresh_error_display() {
        let err = AuthenticationError::InvalidRefreshToken {
            reason: "expired".to_string(),
        };
        assert_eq!(err.to_string(), "invalid refresh token: expired");
    }

    #[test]
    fn banned_display() {
        assert_eq!(
            AuthenticationError::AccountBanned.to_string(),
            "account is banned"
        );
    }
}
