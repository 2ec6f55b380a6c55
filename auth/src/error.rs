//! Error taxonomy for the auth core.
//!
//! ERROR HANDLING
//! ==============
//! Token decode failures are recovered locally by the codec and surface as
//! "expired". Transport, rejection, and validation failures propagate to the
//! caller verbatim. Cancellation is a variant of its own so callers can drop
//! it without rendering anything.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use std::collections::BTreeMap;

use serde_json::Value;

// =============================================================================
// DECODE ERROR
// =============================================================================

/// Why an access token could not be turned into claims or an identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The token is not three dot-separated segments.
    #[error("token is not a three-segment JWT")]
    Malformed,
    /// The payload segment is not base64url.
    #[error("token payload is not base64url: {0}")]
    Base64(String),
    /// The payload is not a JSON object, or a claim has the wrong shape.
    #[error("token claims are invalid: {0}")]
    Claims(String),
    /// The payload carries no `exp` claim.
    #[error("token has no expiry claim")]
    MissingExpiry,
    /// The `user_role` claim is outside the closed role set.
    #[error("unknown role `{0}`")]
    UnknownRole(String),
}

// =============================================================================
// FIELD ERRORS
// =============================================================================

/// Field-keyed validation messages returned by the backend on registration.
///
/// Each field's message list is joined with `", "` so it can be attached to the
/// matching form field as a single string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Parse a backend validation body such as
    /// `{"manager_email": ["user with this email already exists."]}`.
    ///
    /// Returns `None` when the body is not a non-empty object whose values are
    /// strings or arrays of strings.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let object = payload.as_object()?;
        if object.is_empty() {
            return None;
        }
        let mut fields = BTreeMap::new();
        for (field, messages) in object {
            let joined = match messages {
                Value::String(message) => message.clone(),
                Value::Array(items) => {
                    let mut parts = Vec::with_capacity(items.len());
                    for item in items {
                        parts.push(item.as_str()?.to_owned());
                    }
                    parts.join(", ")
                }
                _ => return None,
            };
            fields.insert(field.clone(), joined);
        }
        Some(Self(fields))
    }

    /// Message for `field`, if the backend rejected it.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Iterate `(field, message)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

// =============================================================================
// AUTH ERROR
// =============================================================================

/// Errors produced by auth and API operations.
///
/// `Clone` so a single refresh outcome can be shared by every request that
/// waited on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// The request exceeded the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend rejected the credentials (401/403).
    #[error("authentication rejected (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The backend rejected one or more submitted fields.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Any other non-success status.
    #[error("unexpected response status {status}")]
    Status { status: u16, body: String },

    /// A success response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// A token could not be decoded.
    #[error("token decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The caller canceled the operation before it completed.
    #[error("request canceled")]
    Canceled,

    /// The operation needs a logged-in session and there is none.
    #[error("not logged in")]
    NotLoggedIn,

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl AuthError {
    /// Stable machine-readable code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Timeout => "E_TIMEOUT",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Validation(_) => "E_VALIDATION",
            Self::Status { .. } => "E_STATUS",
            Self::Parse(_) => "E_PARSE",
            Self::Decode(_) => "E_DECODE",
            Self::Canceled => "E_CANCELED",
            Self::NotLoggedIn => "E_NOT_LOGGED_IN",
            Self::Config(_) => "E_CONFIG",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// `true` for cancellation, which callers discard silently.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Field errors when this is a validation failure.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Map a non-success status and its body onto the taxonomy.
///
/// - 400 with a field map becomes [`AuthError::Validation`]
/// - 401/403 become [`AuthError::Rejected`], preferring the DRF `detail` message
/// - everything else is [`AuthError::Status`]
pub(crate) fn status_error(status: u16, body: &str) -> AuthError {
    let payload: Option<Value> = serde_json::from_str(body).ok();
    match status {
        400 => match payload.as_ref().and_then(FieldErrors::from_payload) {
            Some(fields) => AuthError::Validation(fields),
            None => AuthError::Status { status, body: body.to_owned() },
        },
        401 | 403 => {
            let detail = payload
                .as_ref()
                .and_then(|value| value.get("detail"))
                .and_then(Value::as_str)
                .map_or_else(|| body.to_owned(), str::to_owned);
            AuthError::Rejected { status, detail }
        }
        _ => AuthError::Status { status, body: body.to_owned() },
    }
}
