//! Cancellable data/error/loading triple for one remote resource.
//!
//! DESIGN
//! ======
//! A [`Resource`] is a cloneable handle; views read [`Resource::snapshot`]
//! while a load is in flight. `load` marks the resource loading, runs the
//! request, then records either the data (clearing any error) or the error
//! (keeping the last good data).
//!
//! `is_loading` stays set while any load on the resource is pending, so
//! overlapping loads do not clear it for each other. A canceled load, whether
//! through the token or by dropping the future, only gives up its share of
//! the flag and writes nothing else.

#[cfg(test)]
#[path = "resource_test.rs"]
mod tests;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use auth::CancellationToken;

use crate::error::ConsoleError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub error: Option<ConsoleError>,
    pub is_loading: bool,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self { data: None, error: None, is_loading: false }
    }
}

/// What a single `load` did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome<T> {
    Loaded(T),
    Failed(ConsoleError),
    Canceled,
}

struct Tracked<T> {
    state: ResourceState<T>,
    pending: usize,
}

impl<T> Tracked<T> {
    fn release(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        self.state.is_loading = self.pending > 0;
    }
}

pub struct Resource<T> {
    inner: Arc<Mutex<Tracked<T>>>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(Tracked { state: ResourceState::default(), pending: 0 })) }
    }
}

impl<T: Clone> Resource<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tracked<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> ResourceState<T> {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn data(&self) -> Option<T> {
        self.lock().state.data.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<ConsoleError> {
        self.lock().state.error.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().state.is_loading
    }

    /// Run `request` and record its outcome unless `cancel` fires first.
    pub async fn load<F>(&self, request: F, cancel: &CancellationToken) -> LoadOutcome<T>
    where
        F: Future<Output = Result<T, ConsoleError>>,
    {
        if cancel.is_cancelled() {
            return LoadOutcome::Canceled;
        }
        let mut pending = PendingLoad::begin(self);

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = request => Some(result),
        };

        match result {
            None => LoadOutcome::Canceled,
            Some(Err(error)) if error.is_cancellation() => LoadOutcome::Canceled,
            Some(Ok(data)) => {
                pending.finish(|state| {
                    state.data = Some(data.clone());
                    state.error = None;
                });
                LoadOutcome::Loaded(data)
            }
            Some(Err(error)) => {
                tracing::debug!(code = error.error_code(), error = %error, "resource load failed");
                pending.finish(|state| state.error = Some(error.clone()));
                LoadOutcome::Failed(error)
            }
        }
    }
}

/// One `load`'s share of the loading flag. Dropping it unfinished releases
/// the share without touching data or error.
struct PendingLoad<'a, T: Clone> {
    resource: &'a Resource<T>,
    finished: bool,
}

impl<'a, T: Clone> PendingLoad<'a, T> {
    fn begin(resource: &'a Resource<T>) -> Self {
        let mut inner = resource.lock();
        inner.pending += 1;
        inner.state.is_loading = true;
        Self { resource, finished: false }
    }

    fn finish(&mut self, apply: impl FnOnce(&mut ResourceState<T>)) {
        let mut inner = self.resource.lock();
        apply(&mut inner.state);
        inner.release();
        self.finished = true;
    }
}

impl<T: Clone> Drop for PendingLoad<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.resource.lock().release();
        }
    }
}
