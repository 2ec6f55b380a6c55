use super::*;

#[test]
fn parses_every_wire_spelling() {
    for role in Role::ALL {
        assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        assert_eq!(role.to_string(), role.as_str());
    }
}

#[test]
fn unknown_role_is_a_decode_error() {
    assert_eq!("superuser".parse::<Role>(), Err(DecodeError::UnknownRole("superuser".to_owned())));
    assert!("Admin".parse::<Role>().is_err());
}

#[test]
fn serde_uses_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
    let role: Role = serde_json::from_str("\"student\"").unwrap();
    assert_eq!(role, Role::Student);
}

#[test]
fn only_manager_and_admin_have_dashboards() {
    assert_eq!(Role::Manager.dashboard_path(), Some("/manager-dashboard"));
    assert_eq!(Role::Admin.dashboard_path(), Some("/admin-dashboard"));
    assert_eq!(Role::Teacher.dashboard_path(), None);
    assert_eq!(Role::Student.dashboard_path(), None);
}
