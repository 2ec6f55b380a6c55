//! HTTP plumbing and the intercepted API client.
//!
//! ARCHITECTURE
//! ============
//! Two reqwest clients share one builder: the auth gateway's (plain, so a
//! refresh never re-enters the interceptor) and [`ApiClient`]'s, which runs
//! every request through [`Interceptor::intercept`] before sending.
//!
//! Each call takes a [`CancellationToken`]. Canceling drops the in-flight
//! future (interceptor refresh included) and returns
//! [`AuthError::Canceled`] without touching any state.

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::AuthConfig;
use crate::error::{AuthError, status_error};
use crate::interceptor::Interceptor;

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Build a reqwest client with JSON defaults and the configured timeouts.
pub(crate) fn build_http(config: &AuthConfig) -> Result<reqwest::Client, AuthError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeouts.request_secs))
        .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
        .build()
        .map_err(|e| AuthError::HttpClientBuild(e.to_string()))
}

/// Join an endpoint path onto the base URL. Leading and trailing slashes on
/// either side collapse to exactly one, so `user/login/` and `/user/login/`
/// resolve identically.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.is_empty() {
        return base_url.to_owned();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Read a response: 2xx bodies deserialize into `R` (an empty body reads as
/// JSON `null`), anything else maps onto [`AuthError`].
pub(crate) async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, AuthError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), "request failed");
        return Err(status_error(status.as_u16(), &text));
    }
    parse_body(&text)
}

pub(crate) fn parse_body<R: DeserializeOwned>(text: &str) -> Result<R, AuthError> {
    if text.trim().is_empty() {
        return serde_json::from_value(Value::Null).map_err(|e| AuthError::Parse(e.to_string()));
    }
    serde_json::from_str(text).map_err(|e| AuthError::Parse(e.to_string()))
}

// =============================================================================
// API CLIENT
// =============================================================================

/// Client for authenticated endpoints. Clone to share.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    interceptor: Arc<Interceptor>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &AuthConfig, interceptor: Arc<Interceptor>) -> Result<Self, AuthError> {
        Ok(Self { http: build_http(config)?, base_url: config.base_url.clone(), interceptor })
    }

    /// Absolute URL for an endpoint path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// `GET path`, decoding the JSON body.
    ///
    /// # Errors
    ///
    /// Transport, status, parse, or cancellation failures.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str, cancel: &CancellationToken) -> Result<R, AuthError> {
        let builder = self.http.request(Method::GET, self.endpoint(path));
        self.execute(builder, cancel).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Transport, status, parse, or cancellation failures.
    pub async fn post_json<B, R>(&self, path: &str, body: &B, cancel: &CancellationToken) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let builder = self.http.request(Method::POST, self.endpoint(path)).json(body);
        self.execute(builder, cancel).await
    }

    /// `PATCH path` with a multipart form body.
    ///
    /// # Errors
    ///
    /// Transport, status, parse, or cancellation failures.
    pub async fn patch_multipart<R: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        cancel: &CancellationToken,
    ) -> Result<R, AuthError> {
        let builder = self.http.request(Method::PATCH, self.endpoint(path)).multipart(form);
        self.execute(builder, cancel).await
    }

    /// `DELETE path`. Returns the body, `null` when empty.
    ///
    /// # Errors
    ///
    /// Transport, status, or cancellation failures.
    pub async fn delete(&self, path: &str, cancel: &CancellationToken) -> Result<Value, AuthError> {
        let builder = self.http.request(Method::DELETE, self.endpoint(path));
        self.execute(builder, cancel).await
    }

    async fn execute<R: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<R, AuthError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_owned();

        let exchange = async {
            let request = self.interceptor.intercept(request).await;
            let response = self.http.execute(request).await?;
            read_json(response).await
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(%method, %path, "request canceled");
                Err(AuthError::Canceled)
            }
            result = exchange => {
                if let Err(e) = &result {
                    tracing::debug!(%method, %path, code = e.error_code(), "request failed");
                }
                result
            }
        }
    }
}
