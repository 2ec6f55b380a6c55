//! Auth gateway: the stateless server exchanges the session depends on.
//!
//! The paths below are the backend's contract and are sent as written; see
//! [`join_url`] for how they combine with the base URL.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{build_http, join_url, read_json};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::types::{AuthResponse, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest};

pub const REGISTER_ENDPOINT: &str = "user/register/";
pub const LOGIN_ENDPOINT: &str = "user/login/";
pub const REFRESH_ENDPOINT: &str = "/user/refresh-token/";

#[must_use]
pub fn forgot_password_endpoint(email: &str) -> String {
    format!("/user/forgot-password/{email}/")
}

/// Credential exchanges. No local state; every call is one round-trip.
#[async_trait::async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange email and password for a session.
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError>;

    /// Exchange a refresh token for a renewed session.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError>;

    /// Register an institution and its manager. Field problems come back as
    /// [`AuthError::Validation`].
    async fn register(&self, request: &RegisterRequest) -> Result<Value, AuthError>;

    /// Ask the backend to email a password-reset link.
    async fn forgot_password(&self, email: &str) -> Result<Value, AuthError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

pub struct HttpAuthGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthGateway {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self { http: build_http(config)?, base_url: config.base_url.clone() })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = join_url(&self.base_url, path);
        let response = self.http.post(url).json(body).send().await?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.post(LOGIN_ENDPOINT, &LoginRequest { email, password }).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        self.post(REFRESH_ENDPOINT, &RefreshRequest { refresh: refresh_token }).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Value, AuthError> {
        self.post(REGISTER_ENDPOINT, request).await
    }

    async fn forgot_password(&self, email: &str) -> Result<Value, AuthError> {
        self.post(&forgot_password_endpoint(email), &ForgotPasswordRequest { email }).await
    }
}
