//! Role-based route guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page-level destination goes through [`authorize`] so unauthenticated
//! and wrong-role redirects behave identically everywhere. The decision is a
//! pure function of a session snapshot; it never suspends.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use crate::role::Role;
use crate::store::Session;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the protected content.
    Render,
    /// Navigate elsewhere, replacing the current history entry.
    Redirect(&'static str),
}

/// No user: login. User with a role outside `allowed`: home. Otherwise render.
#[must_use]
pub fn authorize(session: &Session, allowed: &[Role]) -> GuardDecision {
    let Some(user) = &session.user else {
        return GuardDecision::Redirect(LOGIN_PATH);
    };
    if allowed.contains(&user.role) {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect(HOME_PATH)
    }
}

/// A navigable destination and the roles it admits (`None` = public).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub path: &'static str,
    pub allowed: Option<&'static [Role]>,
}

pub const ROUTES: &[RouteSpec] = &[
    RouteSpec { path: HOME_PATH, allowed: None },
    RouteSpec { path: LOGIN_PATH, allowed: None },
    RouteSpec { path: "/signup", allowed: None },
    RouteSpec { path: "/forgot-password", allowed: None },
    RouteSpec { path: "/manager-dashboard", allowed: Some(&[Role::Manager]) },
    RouteSpec { path: "/admin-dashboard", allowed: Some(&[Role::Admin]) },
];

/// Look up `path` in [`ROUTES`] and decide. `None` for unknown paths.
#[must_use]
pub fn route_decision(session: &Session, path: &str) -> Option<GuardDecision> {
    let route = ROUTES.iter().find(|route| route.path == path)?;
    Some(match route.allowed {
        None => GuardDecision::Render,
        Some(allowed) => authorize(session, allowed),
    })
}
