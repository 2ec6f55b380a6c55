//! Request interceptor: attach a fresh bearer credential to every request.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs inside [`ApiClient`](crate::client::ApiClient) before each send. It
//! reads credentials from persistence rather than the session store, so the
//! first request after a restart works before the store is hydrated.
//!
//! DESIGN
//! ======
//! Expired access tokens are renewed before the request leaves. Concurrent
//! requests that all find an expired token share a single refresh: the first
//! one parks a `Shared` future in the slot, the rest clone and await it, and
//! the session store is written exactly once when it resolves.
//!
//! The slot counts its waiters. When the last one is dropped before the
//! refresh resolves, the slot is emptied and the `Shared` future with it, so
//! the next expired request starts a new exchange instead of resuming the
//! abandoned one.
//!
//! A refresh that resolves after the session changed generation (a logout or
//! another login) is discarded. Its waiters get the token of the session now
//! in force, if there is one.
//!
//! ERROR HANDLING
//! ==============
//! A failed refresh is logged, never retried, and the request goes out
//! without an `Authorization` header so the backend's own rejection reaches
//! the caller. [`RefreshFailurePolicy`] decides whether the session is also
//! cleared so route guards send the user back to login.

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};
use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::error::AuthError;
use crate::gateway::AuthGateway;
use crate::persistence::{ACCESS_TOKEN_SLOT, REFRESH_TOKEN_SLOT};
use crate::store::SessionStore;
use crate::token::{self, Freshness};

/// What happens to the session when a silent refresh fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshFailurePolicy {
    /// Clear the session; guards redirect to login on the next check.
    #[default]
    Logout,
    /// Leave the session as it is and let the backend reject the request.
    KeepSession,
}

type RefreshFuture = Shared<BoxFuture<'static, Result<String, AuthError>>>;

struct InFlight {
    id: u64,
    future: RefreshFuture,
    waiters: usize,
}

#[derive(Default)]
struct RefreshSlot {
    next_id: u64,
    in_flight: Option<InFlight>,
}

pub struct Interceptor {
    session: SessionStore,
    gateway: Arc<dyn AuthGateway>,
    policy: RefreshFailurePolicy,
    slot: Mutex<RefreshSlot>,
}

impl Interceptor {
    #[must_use]
    pub fn new(session: SessionStore, gateway: Arc<dyn AuthGateway>, policy: RefreshFailurePolicy) -> Self {
        Self { session, gateway, policy, slot: Mutex::new(RefreshSlot::default()) }
    }

    #[must_use]
    pub fn policy(&self) -> RefreshFailurePolicy {
        self.policy
    }

    /// `true` while a refresh is parked in the slot.
    #[must_use]
    pub fn refresh_in_flight(&self) -> bool {
        self.lock_slot().in_flight.is_some()
    }

    fn lock_slot(&self) -> MutexGuard<'_, RefreshSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `Authorization: Bearer <access>` to `request` when a usable
    /// credential exists, refreshing first if needed. Never fails: without a
    /// credential the request is returned unmodified.
    pub async fn intercept(&self, mut request: reqwest::Request) -> reqwest::Request {
        let Some(access) = self.bearer_token().await else {
            return request;
        };
        match HeaderValue::from_str(&format!("Bearer {access}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(e) => tracing::warn!(error = %e, "access token is not a valid header value; sending unauthenticated"),
        }
        request
    }

    /// The access token to attach to the next request, if any.
    pub async fn bearer_token(&self) -> Option<String> {
        let credentials = self.session.credentials();
        let (Some(access), Some(refresh)) = (credentials.get(ACCESS_TOKEN_SLOT), credentials.get(REFRESH_TOKEN_SLOT))
        else {
            tracing::trace!("no stored credentials; sending unauthenticated");
            return None;
        };

        if let Freshness::Fresh(_) = token::inspect(&access) {
            return Some(access);
        }

        match self.refresh(&access, &refresh).await {
            Ok(renewed) => Some(renewed),
            Err(AuthError::NotLoggedIn) => {
                tracing::debug!("session ended while refreshing; sending unauthenticated");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), policy = ?self.policy, "token refresh failed");
                if self.policy == RefreshFailurePolicy::Logout {
                    self.session.logout();
                }
                None
            }
        }
    }

    /// Renew the session with `refresh_token`, joining a refresh already in
    /// flight if there is one. Returns the new access token.
    ///
    /// `stale_access` is the token the caller found expired; if persistence
    /// already holds a different, fresh token (another refresh finished in
    /// between), that token is returned without a round-trip.
    ///
    /// # Errors
    ///
    /// Propagates the gateway failure, or [`AuthError::NotLoggedIn`] when the
    /// session was logged out while the refresh was in flight and nobody has
    /// logged in since.
    pub async fn refresh(&self, stale_access: &str, refresh_token: &str) -> Result<String, AuthError> {
        let (waiter, future) = {
            let mut slot = self.lock_slot();
            if let Some(in_flight) = slot.in_flight.as_mut() {
                tracing::debug!("joining in-flight token refresh");
                in_flight.waiters += 1;
                (RefreshWaiter { interceptor: self, id: in_flight.id }, in_flight.future.clone())
            } else {
                if let Some(current) = self.session.credentials().get(ACCESS_TOKEN_SLOT)
                    && current != stale_access
                    && !token::is_expired(&current)
                {
                    return Ok(current);
                }
                slot.next_id = slot.next_id.wrapping_add(1);
                let id = slot.next_id;
                let future = self.refresh_future(refresh_token.to_owned()).shared();
                slot.in_flight = Some(InFlight { id, future: future.clone(), waiters: 1 });
                (RefreshWaiter { interceptor: self, id }, future)
            }
        };

        let result = future.await;
        waiter.resolved();
        result
    }

    fn refresh_future(&self, refresh_token: String) -> BoxFuture<'static, Result<String, AuthError>> {
        let gateway = Arc::clone(&self.gateway);
        let session = self.session.clone();
        let epoch = session.epoch();
        async move {
            tracing::debug!("refreshing access token");
            let response = gateway.refresh(&refresh_token).await?;
            let access = response.access.clone();
            if !session.establish_if_epoch(epoch, response) {
                return session.access_token().ok_or(AuthError::NotLoggedIn);
            }
            tracing::info!("access token refreshed");
            Ok(access)
        }
        .boxed()
    }
}

/// One caller's stake in the parked refresh. Dropping it unresolved
/// releases the slot once no other caller is waiting.
struct RefreshWaiter<'a> {
    interceptor: &'a Interceptor,
    id: u64,
}

impl RefreshWaiter<'_> {
    /// The refresh finished: empty the slot for everyone.
    fn resolved(self) {
        let mut slot = self.interceptor.lock_slot();
        if slot.in_flight.as_ref().is_some_and(|f| f.id == self.id) {
            slot.in_flight = None;
        }
    }
}

impl Drop for RefreshWaiter<'_> {
    fn drop(&mut self) {
        let mut slot = self.interceptor.lock_slot();
        let Some(in_flight) = slot.in_flight.as_mut().filter(|f| f.id == self.id) else {
            return;
        };
        in_flight.waiters = in_flight.waiters.saturating_sub(1);
        if in_flight.waiters == 0 {
            tracing::debug!("every waiter left; abandoning token refresh");
            slot.in_flight = None;
        }
    }
}
