//! Session context: the dependency-injected entry point to the auth core.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views and commands receive a [`SessionContext`] instead of reaching for a
//! global. It owns the store, the gateway, and the interceptor, and runs the
//! multi-step flows (initialize, login) that coordinate them.
//!
//! Dropping one of the returned futures cancels the flow. The loading flag is
//! held by a drop guard and no store write happens before the network answer,
//! so a canceled flow leaves the session exactly as it found it.

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;

use std::sync::Arc;

use serde_json::Value;

use crate::client::ApiClient;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::gateway::{AuthGateway, HttpAuthGateway};
use crate::guard::{self, GuardDecision};
use crate::interceptor::{Interceptor, RefreshFailurePolicy};
use crate::persistence::{ACCESS_TOKEN_SLOT, CredentialStore, REFRESH_TOKEN_SLOT};
use crate::role::Role;
use crate::store::SessionStore;
use crate::token::{self, Freshness};
use crate::types::{AuthResponse, Identity, RegisterRequest};

#[derive(Clone)]
pub struct SessionContext {
    store: SessionStore,
    gateway: Arc<dyn AuthGateway>,
    interceptor: Arc<Interceptor>,
}

impl SessionContext {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        gateway: Arc<dyn AuthGateway>,
        policy: RefreshFailurePolicy,
    ) -> Self {
        let store = SessionStore::new(credentials);
        let interceptor = Arc::new(Interceptor::new(store.clone(), Arc::clone(&gateway), policy));
        Self { store, gateway, interceptor }
    }

    /// Context talking to the HTTP backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &AuthConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, AuthError> {
        let gateway = Arc::new(HttpAuthGateway::new(config)?);
        Ok(Self::new(credentials, gateway, config.refresh_failure))
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn interceptor(&self) -> Arc<Interceptor> {
        Arc::clone(&self.interceptor)
    }

    /// API client whose requests carry this session's credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn api_client(&self, config: &AuthConfig) -> Result<ApiClient, AuthError> {
        ApiClient::new(config, self.interceptor())
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    /// Hydrate the store from persisted credentials. Run once at startup.
    ///
    /// Fresh access token: decode it into the user. Expired: refresh, and
    /// log out if that fails. Nothing persisted: stay logged out.
    pub async fn initialize(&self) {
        let _loading = self.store.begin_loading();
        let credentials = self.store.credentials();
        let (Some(access), Some(refresh)) = (credentials.get(ACCESS_TOKEN_SLOT), credentials.get(REFRESH_TOKEN_SLOT))
        else {
            tracing::debug!("no persisted session");
            return;
        };

        match token::inspect(&access) {
            Freshness::Fresh(claims) => match claims.identity() {
                Ok(user) => {
                    tracing::info!(user_id = user.id, role = %user.role, "session restored");
                    self.store.establish(AuthResponse { access, refresh, user });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "persisted access token has unusable claims");
                    self.store.logout();
                }
            },
            Freshness::Expired => {
                if let Err(e) = self.interceptor.refresh(&access, &refresh).await {
                    tracing::warn!(error = %e, "session refresh on startup failed");
                    self.store.logout();
                }
            }
        }
    }

    /// Log in and populate the session.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures; [`AuthError::Rejected`] for bad
    /// credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let _loading = self.store.begin_loading();
        let response = self.gateway.login(email, password).await?;
        let user = response.user.clone();
        self.store.establish(response);
        tracing::info!(user_id = user.id, role = %user.role, "logged in");
        Ok(user)
    }

    /// Register an institution. Does not log in.
    ///
    /// # Errors
    ///
    /// [`AuthError::Validation`] carries per-field messages.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, AuthError> {
        self.gateway.register(request).await
    }

    /// Request a password-reset email.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn forgot_password(&self, email: &str) -> Result<Value, AuthError> {
        self.gateway.forgot_password(email).await
    }

    pub fn logout(&self) {
        self.store.logout();
    }

    /// Route guard over the current snapshot.
    #[must_use]
    pub fn guard(&self, allowed: &[Role]) -> GuardDecision {
        guard::authorize(&self.store.snapshot(), allowed)
    }
}
