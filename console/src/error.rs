//! Console error type.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use auth::{AuthError, Role};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("logged-in account has no institution")]
    MissingInstitution,

    #[error("logged-in account is not an admin")]
    MissingAdminId,

    #[error("admins can only create teacher or student accounts, not {0}")]
    UnsupportedRole(Role),

    #[error("profile update has no fields")]
    EmptyUpdate,
}

impl ConsoleError {
    /// Stable machine-readable code; auth failures keep their own code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(inner) => inner.error_code(),
            Self::NotLoggedIn => "E_NOT_LOGGED_IN",
            Self::MissingInstitution => "E_MISSING_INSTITUTION",
            Self::MissingAdminId => "E_MISSING_ADMIN_ID",
            Self::UnsupportedRole(_) => "E_UNSUPPORTED_ROLE",
            Self::EmptyUpdate => "E_EMPTY_UPDATE",
        }
    }

    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Auth(inner) if inner.is_cancellation())
    }
}
