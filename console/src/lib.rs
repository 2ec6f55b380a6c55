//! Typed bindings for the manager and admin REST surface.
//!
//! Every call goes through [`auth::ApiClient`], so bearer attachment and
//! silent refresh happen underneath. Institution and admin references come
//! from the logged-in identity rather than from process-wide constants.

pub mod api;
pub mod error;
pub mod resource;
pub mod types;

pub use api::ConsoleApi;
pub use error::ConsoleError;
pub use resource::{LoadOutcome, Resource, ResourceState};
pub use types::{Admin, AdminUser, ManagerProfile, NewAdmin, NewUser, ProfileUpdate, ProfileUser, ResultList, UserRecord};
