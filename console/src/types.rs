//! Wire DTOs for the console endpoints.
//!
//! Institution references arrive as numbers or strings depending on the
//! serializer; both normalize to `String` via
//! [`auth::types::deserialize_reference`].

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use auth::Role;
use auth::types::deserialize_reference;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

// =============================================================================
// RESPONSES
// =============================================================================

/// Paginated list envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultList<T> {
    pub count: u64,
    pub results: Vec<T>,
}

/// Account embedded in an [`Admin`] row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_role: Option<String>,
    #[serde(default, deserialize_with = "deserialize_reference")]
    pub institution: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    /// Admin profile id; this is what `delete_admin` takes.
    pub id: i64,
    pub user: AdminUser,
    #[serde(default, deserialize_with = "deserialize_reference")]
    pub institution: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Teacher or student row as listed for an admin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    pub user_role: Role,
    #[serde(default, deserialize_with = "deserialize_reference")]
    pub institution_id: Option<String>,
    #[serde(default)]
    pub admin_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerProfile {
    pub id: i64,
    pub user: ProfileUser,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, deserialize_with = "deserialize_reference")]
    pub institution: Option<String>,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Body of `POST /manager/create-admin/`. The role is always `admin`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewAdmin {
    pub email: String,
    pub institution_id: String,
    user_role: Role,
}

impl NewAdmin {
    #[must_use]
    pub fn new(email: impl Into<String>, institution_id: impl Into<String>) -> Self {
        Self { email: email.into(), institution_id: institution_id.into(), user_role: Role::Admin }
    }
}

/// Body of `POST /admin/create-user/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub email: String,
    pub user_role: Role,
    pub institution_id: String,
    pub admin_id: i64,
}

/// Partial manager profile edit, sent as `multipart/form-data`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.phone_number.is_none()
    }

    /// Multipart field names, nested user fields in bracket notation.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(3);
        if let Some(username) = &self.username {
            fields.push(("user[username]", username.clone()));
        }
        if let Some(email) = &self.email {
            fields.push(("user[email]", email.clone()));
        }
        if let Some(phone_number) = &self.phone_number {
            fields.push(("phone_number", phone_number.clone()));
        }
        fields
    }

    #[must_use]
    pub fn into_form(self) -> Form {
        self.fields().into_iter().fold(Form::new(), |form, (name, value)| form.text(name, value))
    }
}
