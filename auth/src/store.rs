//! Session store: the single source of truth for who is logged in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Constructed once and handed (cloned) to every component that needs the
//! session. There is no module-level state. Route guards read snapshots,
//! views subscribe to changes, and the interceptor writes renewed tokens back
//! through [`SessionStore::establish_if_epoch`].
//!
//! DESIGN
//! ======
//! All mutations run under one mutex, persistence side effects included, so a
//! reader never observes a user without tokens or tokens half-cleared by a
//! logout. Persistence failures are logged and never block the in-memory
//! change. Every token write and every logout bumps an epoch counter, so a
//! refresh that started before a logout or a newer login cannot overwrite the
//! session when it resolves.

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::persistence::{ACCESS_TOKEN_SLOT, CredentialStore, REFRESH_TOKEN_SLOT};
use crate::types::{AuthResponse, Identity};

/// Point-in-time view of the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<Identity>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// `true` only while login or initialization is in flight.
    pub loading: bool,
}

impl Session {
    /// `true` iff a user and an access token are both present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some() && self.access_token.is_some()
    }
}

struct StoreInner {
    session: Session,
    epoch: u64,
}

/// Cheaply clonable handle to the shared session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
    credentials: Arc<dyn CredentialStore>,
    changes: Arc<watch::Sender<Session>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        let (changes, _) = watch::channel(Session::default());
        Self {
            inner: Arc::new(Mutex::new(StoreInner { session: Session::default(), epoch: 0 })),
            credentials,
            changes: Arc::new(changes),
        }
    }

    /// Credential persistence backing this store.
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &StoreInner) {
        self.changes.send_replace(inner.session.clone());
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Replace the user. Tokens are untouched.
    pub fn set_user(&self, user: Option<Identity>) {
        let mut inner = self.lock();
        inner.session.user = user;
        self.publish(&inner);
    }

    /// Persist both tokens, then update the in-memory copies.
    pub fn set_tokens(&self, access: &str, refresh: &str) {
        let mut inner = self.lock();
        self.write_tokens(&mut inner, access, refresh);
        self.publish(&inner);
    }

    /// Set the user after a successful login. Callers set tokens first.
    pub fn login(&self, user: Identity) {
        let mut inner = self.lock();
        inner.session.user = Some(user);
        self.publish(&inner);
    }

    /// `set_tokens` followed by `login`, as one atomic update.
    pub fn establish(&self, response: AuthResponse) {
        let mut inner = self.lock();
        self.apply(&mut inner, response);
        self.publish(&inner);
    }

    /// Like [`establish`](Self::establish), but only if the session has not
    /// changed generation since `epoch` was read. Returns whether the
    /// response was applied.
    pub fn establish_if_epoch(&self, epoch: u64, response: AuthResponse) -> bool {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            tracing::debug!(expected = epoch, current = inner.epoch, "session ended meanwhile; discarding tokens");
            return false;
        }
        self.apply(&mut inner, response);
        self.publish(&inner);
        true
    }

    /// Clear both persisted slots and the in-memory user and tokens.
    pub fn logout(&self) {
        let mut inner = self.lock();
        for slot in [ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT] {
            if let Err(e) = self.credentials.remove(slot) {
                tracing::warn!(error = %e, slot, "failed to clear persisted credential");
            }
        }
        let had_user = inner.session.user.is_some();
        inner.session.user = None;
        inner.session.access_token = None;
        inner.session.refresh_token = None;
        inner.epoch = inner.epoch.wrapping_add(1);
        self.publish(&inner);
        if had_user {
            tracing::info!("logged out");
        }
    }

    pub fn set_loading(&self, loading: bool) {
        let mut inner = self.lock();
        inner.session.loading = loading;
        self.publish(&inner);
    }

    /// Mark the session loading until the returned guard drops. A dropped
    /// (canceled) operation therefore always clears the flag again.
    #[must_use = "loading is cleared when the guard drops"]
    pub fn begin_loading(&self) -> LoadingGuard {
        self.set_loading(true);
        LoadingGuard { store: self.clone() }
    }

    fn apply(&self, inner: &mut StoreInner, response: AuthResponse) {
        self.write_tokens(inner, &response.access, &response.refresh);
        tracing::debug!(user_id = response.user.id, role = %response.user.role, "session established");
        inner.session.user = Some(response.user);
    }

    fn write_tokens(&self, inner: &mut StoreInner, access: &str, refresh: &str) {
        if let Err(e) = self.credentials.set_pair([(ACCESS_TOKEN_SLOT, access), (REFRESH_TOKEN_SLOT, refresh)]) {
            tracing::warn!(error = %e, "failed to persist credentials; session kept in memory only");
        }
        inner.session.access_token = Some(access.to_owned());
        inner.session.refresh_token = Some(refresh.to_owned());
        inner.epoch = inner.epoch.wrapping_add(1);
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// In-memory check only; no I/O.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.lock().session.is_logged_in()
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<Identity> {
        self.lock().session.user.clone()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.lock().session.access_token.clone()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.lock().session.refresh_token.clone()
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.lock().session.loading
    }

    /// Session generation; see [`establish_if_epoch`](Self::establish_if_epoch).
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Observe every subsequent mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.changes.subscribe()
    }
}

/// Clears the loading flag on drop.
pub struct LoadingGuard {
    store: SessionStore,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}
