//! Manager and admin endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! Paths are the backend's contract and are kept exactly as the browser
//! client sends them, leading slash or not; [`auth::client::join_url`]
//! normalizes the join. The institution and admin ids in those paths are read
//! from the session identity at call time, so a re-login as another account
//! is picked up without rebuilding the binding.

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use auth::{ApiClient, AuthConfig, CancellationToken, Identity, Role, SessionContext, SessionStore};
use serde_json::Value;

use crate::error::ConsoleError;
use crate::types::{Admin, ManagerProfile, NewAdmin, NewUser, ProfileUpdate, ResultList, UserRecord};

pub const CREATE_ADMIN_ENDPOINT: &str = "/manager/create-admin/";
pub const CREATE_USER_ENDPOINT: &str = "/admin/create-user/";

#[must_use]
pub fn admins_list_endpoint(institution_id: &str) -> String {
    format!("/manager/{institution_id}/admins-list/")
}

#[must_use]
pub fn users_list_endpoint(institution_id: &str) -> String {
    format!("admin/{institution_id}/teacher-student-list/")
}

#[must_use]
pub fn admin_detail_endpoint(institution_id: &str, admin_id: i64) -> String {
    format!("/manager/{institution_id}/admin-detail/{admin_id}/")
}

#[must_use]
pub fn profile_endpoint(institution_id: &str) -> String {
    format!("/manager/{institution_id}/profile/")
}

#[derive(Clone)]
pub struct ConsoleApi {
    client: ApiClient,
    session: SessionStore,
}

impl ConsoleApi {
    #[must_use]
    pub fn new(client: ApiClient, session: SessionStore) -> Self {
        Self { client, session }
    }

    /// Binding over `context`'s session, talking to `config`'s backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_context(context: &SessionContext, config: &AuthConfig) -> Result<Self, ConsoleError> {
        Ok(Self::new(context.api_client(config)?, context.store().clone()))
    }

    fn identity(&self) -> Result<Identity, ConsoleError> {
        self.session.user().ok_or(ConsoleError::NotLoggedIn)
    }

    fn institution_id(&self) -> Result<String, ConsoleError> {
        self.identity()?.institution.ok_or(ConsoleError::MissingInstitution)
    }

    // =========================================================================
    // MANAGER
    // =========================================================================

    /// # Errors
    ///
    /// Session lookups, transport, status, or cancellation failures.
    pub async fn create_admin(&self, email: &str, cancel: &CancellationToken) -> Result<Value, ConsoleError> {
        let body = NewAdmin::new(email, self.institution_id()?);
        let created: Value = self.client.post_json(CREATE_ADMIN_ENDPOINT, &body, cancel).await?;
        tracing::info!(institution = %body.institution_id, "admin created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Session lookups, transport, status, parse, or cancellation failures.
    pub async fn list_admins(&self, cancel: &CancellationToken) -> Result<ResultList<Admin>, ConsoleError> {
        let path = admins_list_endpoint(&self.institution_id()?);
        Ok(self.client.get_json(&path, cancel).await?)
    }

    /// # Errors
    ///
    /// Session lookups, transport, status, or cancellation failures.
    pub async fn delete_admin(&self, admin_id: i64, cancel: &CancellationToken) -> Result<Value, ConsoleError> {
        let path = admin_detail_endpoint(&self.institution_id()?, admin_id);
        let ack = self.client.delete(&path, cancel).await?;
        tracing::info!(admin_id, "admin deleted");
        Ok(ack)
    }

    /// # Errors
    ///
    /// Session lookups, transport, status, parse, or cancellation failures.
    pub async fn profile(&self, cancel: &CancellationToken) -> Result<ManagerProfile, ConsoleError> {
        let path = profile_endpoint(&self.institution_id()?);
        Ok(self.client.get_json(&path, cancel).await?)
    }

    /// # Errors
    ///
    /// [`ConsoleError::EmptyUpdate`] when nothing is set; otherwise session
    /// lookups, transport, status, parse, or cancellation failures.
    pub async fn update_profile(
        &self,
        update: ProfileUpdate,
        cancel: &CancellationToken,
    ) -> Result<ManagerProfile, ConsoleError> {
        if update.is_empty() {
            return Err(ConsoleError::EmptyUpdate);
        }
        let path = profile_endpoint(&self.institution_id()?);
        Ok(self.client.patch_multipart(&path, update.into_form(), cancel).await?)
    }

    // =========================================================================
    // ADMIN
    // =========================================================================

    /// Create a teacher or student under the logged-in admin.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::UnsupportedRole`] for manager/admin roles,
    /// [`ConsoleError::MissingAdminId`] when the session is not an admin;
    /// otherwise transport, status, or cancellation failures.
    pub async fn create_user(&self, email: &str, role: Role, cancel: &CancellationToken) -> Result<Value, ConsoleError> {
        if !matches!(role, Role::Teacher | Role::Student) {
            return Err(ConsoleError::UnsupportedRole(role));
        }
        let identity = self.identity()?;
        let admin_id = identity.admin_id.ok_or(ConsoleError::MissingAdminId)?;
        let institution_id = identity.institution.ok_or(ConsoleError::MissingInstitution)?;
        let body = NewUser { email: email.to_owned(), user_role: role, institution_id, admin_id };
        let created: Value = self.client.post_json(CREATE_USER_ENDPOINT, &body, cancel).await?;
        tracing::info!(admin_id, role = %role, "user created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Session lookups, transport, status, parse, or cancellation failures.
    pub async fn list_users(&self, cancel: &CancellationToken) -> Result<ResultList<UserRecord>, ConsoleError> {
        let path = users_list_endpoint(&self.institution_id()?);
        Ok(self.client.get_json(&path, cancel).await?)
    }
}
