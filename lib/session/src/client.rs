//! HTTP client for the dashboard API.

use std::time::Duration;

use async_trait::async_trait;
use instar_core::UserId;
use instar_platform_access::Role;
use instar_platform_access::api::{
    BanUpdate, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RoleUpdate, UserProfile,
};
use reqwest::StatusCode;
use rootcause::Report;
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};

use crate::error::ClientError;

/// The refresh call the liveness monitor depends on.
#[async_trait]
pub trait RefreshApi: Send + Sync {
    /// Exchanges a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String, Report<ClientError>>;
}

/// reqwest-backed client for the dashboard server.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, Report<ClientError>> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::NetworkFailure {
                details: format!("failed to create HTTP client: {e}"),
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Signs in with email and password.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, Report<ClientError>> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = send(self.http.post(self.url("/api/login")).json(&body)).await?;
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ClientError::InvalidCredentials.into()),
            _ => parse(response, "user").await,
        }
    }

    /// Creates a new account with the `user` role.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<UserProfile, Report<ClientError>> {
        let response = send(self.http.post(self.url("/api/register")).json(request)).await?;
        parse(response, "user").await
    }

    /// Fetches one user's profile.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_profile(
        &self,
        user_id: UserId,
        access_token: &str,
    ) -> Result<UserProfile, Report<ClientError>> {
        let request = self
            .http
            .get(self.url(&format!("/api/users/{user_id}")))
            .bearer_auth(access_token);
        parse(send(request).await?, "user").await
    }

    /// Lists every user; admin only.
    #[instrument(skip(self, access_token))]
    pub async fn list_users(
        &self,
        access_token: &str,
    ) -> Result<Vec<UserProfile>, Report<ClientError>> {
        let request = self.http.get(self.url("/api/users")).bearer_auth(access_token);
        parse(send(request).await?, "users").await
    }

    /// Changes a user's role; admin only.
    #[instrument(skip(self, access_token))]
    pub async fn update_role(
        &self,
        user_id: UserId,
        role: Role,
        access_token: &str,
    ) -> Result<UserProfile, Report<ClientError>> {
        let request = self
            .http
            .patch(self.url(&format!("/api/users/{user_id}/role")))
            .bearer_auth(access_token)
            .json(&RoleUpdate { role });
        parse(send(request).await?, "user").await
    }

    /// Sets or clears a user's ban flag; admin only.
    #[instrument(skip(self, access_token))]
    pub async fn set_banned(
        &self,
        user_id: UserId,
        banned: bool,
        access_token: &str,
    ) -> Result<UserProfile, Report<ClientError>> {
        let request = self
            .http
            .patch(self.url(&format!("/api/users/{user_id}/ban")))
            .bearer_auth(access_token)
            .json(&BanUpdate { banned });
        parse(send(request).await?, "user").await
    }

    /// Deletes a user; admin only.
    #[instrument(skip(self, access_token))]
    pub async fn delete_user(
        &self,
        user_id: UserId,
        access_token: &str,
    ) -> Result<(), Report<ClientError>> {
        let request = self
            .http
            .delete(self.url(&format!("/api/users/{user_id}")))
            .bearer_auth(access_token);
        let response = send(request).await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(status_error(status, "user").into()),
        }
    }
}

#[async_trait]
impl RefreshApi for HttpApiClient {
    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<String, Report<ClientError>> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response = send(self.http.post(self.url("/api/refreshtoken")).json(&body)).await?;
        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(ClientError::InvalidRefreshToken.into())
            }
            _ => {
                let refreshed: RefreshResponse = parse(response, "token").await?;
                Ok(refreshed.access_token)
            }
        }
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, Report<ClientError>> {
    let response = request.send().await.map_err(|e| {
        warn!(error = %e, "request failed");
        ClientError::NetworkFailure {
            details: e.to_string(),
        }
    })?;
    Ok(response)
}

async fn parse<T: DeserializeOwned>(
    response: reqwest::Response,
    resource: &str,
) -> Result<T, Report<ClientError>> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status, resource).into());
    }
    let body = response.json().await.map_err(|e| ClientError::NetworkFailure {
        details: format!("decoding response body: {e}"),
    })?;
    Ok(body)
}

fn status_error(status: StatusCode, resource: &str) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound {
            resource: resource.to_string(),
        },
        other => ClientError::UnexpectedResponse {
            status: other.as_u16(),
        },
    }
}
