//! Access and refresh token issuance, verification and refresh.
//!
//! Both token kinds are HS256 JWTs carrying the user id, role and an
//! absolute expiry. They differ only in their `kind` claim and horizon:
//! access tokens live for minutes, refresh tokens for days. Nothing is
//! recorded server side; a token is valid exactly when its signature,
//! issuer, kind and expiry check out.
//!
//! Expiry is always compared against a caller-supplied `now` rather than
//! the system clock, so every check here is deterministic under test.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use instar_core::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::AuthenticationError;
use crate::role::Role;

/// Signing and lifetime settings for issued tokens.
#[derive(Clone, Deserialize)]
pub struct TokenConfig {
    /// HMAC secret shared by issuer and verifier.
    pub secret: String,

    /// Value of the `iss` claim; tokens with another issuer are rejected.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

fn default_issuer() -> String {
    "instar".to_string()
}

fn default_access_ttl_minutes() -> i64 {
    15
}

fn default_refresh_ttl_days() -> i64 {
    7
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[redacted]")
            .field("issuer", &self.issuer)
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl TokenConfig {
    /// Creates a configuration with default lifetimes.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: default_issuer(),
            access_ttl_minutes: default_access_ttl_minutes(),
            refresh_ttl_days: default_refresh_ttl_days(),
        }
    }

    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_minutes)
    }

    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }
}

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject user.
    pub sub: UserId,
    /// Role at the time of issuance.
    pub role: Role,
    /// Access or refresh.
    pub kind: TokenKind,
    /// Issuer.
    pub iss: String,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

impl TokenClaims {
    /// Returns the absolute expiry instant.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues, verifies and refreshes tokens.
#[derive(Clone)]
pub struct TokenService {
    config: Arc<TokenConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.config.issuer)
            .field("access_ttl_minutes", &self.config.access_ttl_minutes)
            .field("refresh_ttl_days", &self.config.refresh_ttl_days)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Builds a token service from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Signing` if the secret is empty or a lifetime is not positive.
    pub fn new(config: TokenConfig) -> Result<Self, Report<AuthenticationError>> {
        if config.secret.is_empty() {
            return Err(AuthenticationError::Signing {
                reason: "token secret is not configured".to_string(),
            }
            .into());
        }
        if config.access_ttl_minutes <= 0 || config.refresh_ttl_days <= 0 {
            return Err(AuthenticationError::Signing {
                reason: "token lifetimes must be positive".to_string(),
            }
            .into());
        }
        if config.secret.len() < 32 {
            warn!("token secret is shorter than recommended (32 bytes)");
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked by hand against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issues an access/refresh pair for a user who has just authenticated.
    pub fn issue_pair(
        &self,
        user_id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, Report<AuthenticationError>> {
        let access_token = self.issue_access(user_id, role, now)?;
        let refresh_token =
            self.sign(user_id, role, TokenKind::Refresh, now, self.config.refresh_ttl())?;
        debug!(user_id = %user_id, role = %role, "issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Issues a single access token.
    pub fn issue_access(
        &self,
        user_id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, Report<AuthenticationError>> {
        self.sign(user_id, role, TokenKind::Access, now, self.config.access_ttl())
    }

    fn sign(
        &self,
        user_id: UserId,
        role: Role,
        kind: TokenKind,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, Report<AuthenticationError>> {
        let claims = TokenClaims {
            sub: user_id,
            role,
            kind,
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Ulid::new().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthenticationError::Signing {
                reason: e.to_string(),
            })?;
        Ok(token)
    }

    /// Verifies signature, issuer, kind and expiry of a token.
    ///
    /// # Errors
    ///
    /// `TokenExpired` when `exp <= now`, `InvalidToken` for everything else.
    pub fn verify(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, Report<AuthenticationError>> {
        let claims = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthenticationError::InvalidToken {
                reason: e.to_string(),
            })?
            .claims;

        if claims.kind != kind {
            return Err(AuthenticationError::InvalidToken {
                reason: format!("expected {kind:?} token, got {:?}", claims.kind),
            }
            .into());
        }
        if claims.exp <= now.timestamp() {
            return Err(AuthenticationError::TokenExpired.into());
        }

        Ok(claims)
    }

    /// Verifies an access token presented on an API request.
    pub fn verify_access(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, Report<AuthenticationError>> {
        self.verify(token, TokenKind::Access, now)
    }

    /// Verifies a refresh token, folding every failure into `InvalidRefreshToken`.
    pub fn verify_refresh(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, Report<AuthenticationError>> {
        match self.verify(token, TokenKind::Refresh, now) {
            Ok(claims) => Ok(claims),
            Err(report) => Err(AuthenticationError::InvalidRefreshToken {
                reason: report.current_context().to_string(),
            }
            .into()),
        }
    }

    /// Exchanges a valid refresh token for a new access token with the same
    /// identity and role.
    ///
    /// Every call mints a distinct token; concurrent duplicate refreshes are
    /// all honored.
    pub fn refresh(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, Report<AuthenticationError>> {
        let claims = self.verify_refresh(refresh_token, now)?;
        self.issue_access(claims.sub, claims.role, now)
    }
}

/// Only the expiry claim, for unverified client-side inspection.
#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Reads the embedded expiry of a token without checking its signature.
///
/// This is what a client holding no signing key can do; it must never be
/// used to authorize anything.
pub fn expires_at(token: &str) -> Result<DateTime<Utc>, Report<AuthenticationError>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims::<&str>(&[]);

    let claim = jsonwebtoken::decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthenticationError::InvalidToken {
            reason: e.to_string(),
        })?
        .claims;

    let expiry = DateTime::from_timestamp(claim.exp, 0).ok_or_else(|| {
        AuthenticationError::InvalidToken {
            reason: format!("expiry {} is out of range", claim.exp),
        }
    })?;
    Ok(expiry)
}

/// Returns true iff the token's embedded expiry is at or before `now`.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> Result<bool, Report<AuthenticationError>> {
    Ok(expires_at(token)? <= now)
}
