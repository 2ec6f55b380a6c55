//! Client-side authentication and session lifecycle for the campus console.
//!
//! This crate owns everything between "the user typed a password" and "this
//! request carries a valid bearer token": token decoding and expiry, the
//! session store and its durable credential slots, the login/refresh/register
//! exchanges, the request interceptor, and the role-based route guard.
//!
//! Start from [`SessionContext`]; build it once and pass it where needed.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod interceptor;
pub mod persistence;
pub mod role;
pub mod store;
pub mod token;
pub mod types;

#[cfg(test)]
#[path = "support_test.rs"]
pub(crate) mod support;

pub use client::ApiClient;
pub use config::AuthConfig;
pub use context::SessionContext;
pub use error::{AuthError, DecodeError, FieldErrors};
pub use gateway::{AuthGateway, HttpAuthGateway};
pub use guard::{GuardDecision, HOME_PATH, LOGIN_PATH};
pub use interceptor::{Interceptor, RefreshFailurePolicy};
pub use persistence::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use role::Role;
pub use store::{Session, SessionStore};
pub use tokio_util::sync::CancellationToken;
pub use types::{AuthResponse, Identity, RegisterRequest};
