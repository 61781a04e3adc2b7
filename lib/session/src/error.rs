//! Error types for the session client.

use std::fmt;

/// Errors surfaced by the session client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Login was rejected (bad credentials or banned account).
    InvalidCredentials,
    /// The server refused the refresh token.
    InvalidRefreshToken,
    /// The access token was refused on an authenticated call.
    Unauthorized,
    /// The request never produced a response.
    NetworkFailure { details: String },
    /// The requested entity does not exist.
    NotFound { resource: String },
    /// The server answered with a status this client does not expect.
    UnexpectedResponse { status: u16 },
    /// Local token persistence failed.
    Storage { details: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::InvalidRefreshToken => write!(f, "refresh token was rejected"),
            Self::Unauthorized => write!(f, "access token was rejected"),
            Self::NetworkFailure { details } => write!(f, "network failure: {details}"),
            Self::NotFound { resource } => write!(f, "{resource} not found"),
            Self::UnexpectedResponse { status } => {
                write!(f, "unexpected response status {status}")
            }
            Self::Storage { details } => write!(f, "token storage error: {details}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// Returns true for failures that may succeed on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. })
    }
}
