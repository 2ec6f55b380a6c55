//! The closed set of platform roles.

#[cfg(test)]
#[path = "role_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Role carried by every identity. Determines which guarded routes accept it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Manager, Self::Admin, Self::Teacher, Self::Student];

    /// Wire spelling (`user_role` values).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    /// Landing page after login. Teachers and students have no dashboard yet.
    #[must_use]
    pub fn dashboard_path(self) -> Option<&'static str> {
        match self {
            Self::Manager => Some("/manager-dashboard"),
            Self::Admin => Some("/admin-dashboard"),
            Self::Teacher | Self::Student => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DecodeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(DecodeError::UnknownRole(other.to_owned())),
        }
    }
}
