use super::*;
use crate::support::identity;

fn session_for(role: Role) -> Session {
    Session {
        user: Some(identity(1, role)),
        access_token: Some("A1".to_owned()),
        refresh_token: Some("R1".to_owned()),
        loading: false,
    }
}

#[test]
fn no_user_redirects_to_login() {
    assert_eq!(authorize(&Session::default(), &[Role::Admin]), GuardDecision::Redirect(LOGIN_PATH));
}

#[test]
fn wrong_role_redirects_home() {
    assert_eq!(authorize(&session_for(Role::Teacher), &[Role::Admin]), GuardDecision::Redirect(HOME_PATH));
}

#[test]
fn allowed_role_renders() {
    assert_eq!(authorize(&session_for(Role::Admin), &[Role::Manager, Role::Admin]), GuardDecision::Render);
}

#[test]
fn empty_allow_list_admits_nobody() {
    for role in Role::ALL {
        assert_eq!(authorize(&session_for(role), &[]), GuardDecision::Redirect(HOME_PATH));
    }
}

#[test]
fn public_routes_render_for_anyone() {
    for path in ["/", "/login", "/signup", "/forgot-password"] {
        assert_eq!(route_decision(&Session::default(), path), Some(GuardDecision::Render));
    }
}

#[test]
fn dashboards_are_role_gated() {
    assert_eq!(route_decision(&session_for(Role::Manager), "/manager-dashboard"), Some(GuardDecision::Render));
    assert_eq!(
        route_decision(&session_for(Role::Admin), "/manager-dashboard"),
        Some(GuardDecision::Redirect(HOME_PATH))
    );
    assert_eq!(
        route_decision(&Session::default(), "/admin-dashboard"),
        Some(GuardDecision::Redirect(LOGIN_PATH))
    );
}

#[test]
fn every_dashboard_path_is_a_route() {
    for role in Role::ALL {
        if let Some(path) = role.dashboard_path() {
            assert_eq!(route_decision(&session_for(role), path), Some(GuardDecision::Render));
        }
    }
}

#[test]
fn unknown_path_has_no_decision() {
    assert_eq!(route_decision(&session_for(Role::Admin), "/nope"), None);
}
