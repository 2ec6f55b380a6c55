//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use crate::error::AuthError;
use crate::interceptor::RefreshFailurePolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// API root every endpoint path is joined onto.
    pub base_url: String,
    pub timeouts: Timeouts,
    pub refresh_failure: RefreshFailurePolicy,
}

impl AuthConfig {
    /// Defaults with a caller-supplied base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an http(s) URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, AuthError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeouts: Timeouts::default(),
            refresh_failure: RefreshFailurePolicy::default(),
        })
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `CAMPUS_API_BASE_URL`: default `http://127.0.0.1:8000/api/`
    /// - `CAMPUS_REQUEST_TIMEOUT_SECS`: default 10
    /// - `CAMPUS_CONNECT_TIMEOUT_SECS`: default 5
    /// - `CAMPUS_REFRESH_FAILURE`: `logout` (default) or `keep`
    ///
    /// # Errors
    ///
    /// Returns an error for a non-http base URL or an unknown refresh policy.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(lookup("CAMPUS_API_BASE_URL").as_deref().unwrap_or(DEFAULT_API_BASE_URL))?;
        let timeouts = Timeouts {
            request_secs: parse_or(&lookup, "CAMPUS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(&lookup, "CAMPUS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let refresh_failure = parse_refresh_failure(lookup("CAMPUS_REFRESH_FAILURE").as_deref())?;
        Ok(Self { base_url, timeouts, refresh_failure })
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn parse_base_url(raw: &str) -> Result<String, AuthError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(AuthError::Config(format!("base URL must be http(s): {trimmed}")))
    }
}

fn parse_refresh_failure(raw: Option<&str>) -> Result<RefreshFailurePolicy, AuthError> {
    match raw.map(str::trim).unwrap_or("logout") {
        "logout" => Ok(RefreshFailurePolicy::Logout),
        "keep" => Ok(RefreshFailurePolicy::KeepSession),
        other => Err(AuthError::Config(format!(
            "unsupported CAMPUS_REFRESH_FAILURE '{other}' (expected 'logout' or 'keep')"
        ))),
    }
}
