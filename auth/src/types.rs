//! Wire DTOs for the auth endpoints.
//!
//! DESIGN
//! ======
//! `Identity` is both the `user` object of login/refresh responses and the
//! result of decoding access-token claims, so its serde shape accepts both
//! spellings the backend uses (`user_role`/`role`, `institution`/
//! `institution_id`, numeric or string institution references).

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::role::Role;

/// The logged-in user as known to the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend user primary key.
    pub id: i64,
    /// Login name, derived by the backend from the email local part.
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(rename = "user_role", alias = "role")]
    pub role: Role,
    /// Owning institution; `None` for platform-level accounts.
    #[serde(default, alias = "institution_id", deserialize_with = "deserialize_reference")]
    pub institution: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub admin_id: Option<i64>,
    #[serde(default)]
    pub manager_id: Option<i64>,
}

/// Successful login or refresh body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    pub user: Identity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

/// Institution signup form. Field names match the backend serializer so
/// validation errors map straight back onto the form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Institution name.
    pub name: String,
    pub manager_email: String,
    pub manager_contact: String,
    pub manager_password: String,
    pub manager_confirm_password: String,
}

/// Accept `null`, a number, or a string and normalize to `Option<String>`.
/// Empty strings read as `None`. Use with `#[serde(deserialize_with)]` for
/// foreign-key fields the backend renders either way.
///
/// # Errors
///
/// Fails for booleans, arrays, and objects.
pub fn deserialize_reference<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(raw) if raw.is_empty() => Ok(None),
        serde_json::Value::String(raw) => Ok(Some(raw)),
        serde_json::Value::Number(number) => Ok(Some(number.to_string())),
        _ => Err(D::Error::custom("expected string or number reference")),
    }
}
