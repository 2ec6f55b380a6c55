use super::*;
use serde_json::json;

#[test]
fn admin_list_parses() {
    let list: ResultList<Admin> = serde_json::from_value(json!({
        "count": 1,
        "results": [{
            "id": 8,
            "user": {"id": 21, "email": "ad@north.edu", "username": "ad", "user_role": "admin", "institution": "1"},
            "institution": 1,
            "image": null,
            "date": "2024-09-01"
        }]
    }))
    .unwrap();
    assert_eq!(list.count, 1);
    let admin = &list.results[0];
    assert_eq!(admin.id, 8);
    assert_eq!(admin.user.email, "ad@north.edu");
    assert_eq!(admin.institution.as_deref(), Some("1"));
    assert_eq!(admin.image, None);
}

#[test]
fn user_record_requires_known_role() {
    let row: UserRecord = serde_json::from_value(json!({
        "id": 4, "username": "t", "email": "t@north.edu", "user_role": "teacher", "institution_id": 1, "admin_id": 8
    }))
    .unwrap();
    assert_eq!(row.user_role, Role::Teacher);
    assert_eq!(row.admin_id, Some(8));

    let bad = serde_json::from_value::<UserRecord>(json!({"id": 4, "email": "t@x", "user_role": "janitor"}));
    assert!(bad.is_err());
}

#[test]
fn manager_profile_parses() {
    let profile: ManagerProfile = serde_json::from_value(json!({
        "id": 1,
        "user": {"id": 3, "username": "maria", "email": "maria@north.edu"},
        "phone_number": "08012345678",
        "institution": 1
    }))
    .unwrap();
    assert_eq!(profile.user.username.as_deref(), Some("maria"));
    assert_eq!(profile.phone_number, "08012345678");
}

#[test]
fn new_admin_always_sends_admin_role() {
    let body = serde_json::to_value(NewAdmin::new("ad@north.edu", "1")).unwrap();
    assert_eq!(body, json!({"email": "ad@north.edu", "institution_id": "1", "user_role": "admin"}));
}

#[test]
fn new_user_body_shape() {
    let body = serde_json::to_value(NewUser {
        email: "s@north.edu".to_owned(),
        user_role: Role::Student,
        institution_id: "1".to_owned(),
        admin_id: 8,
    })
    .unwrap();
    assert_eq!(body, json!({"email": "s@north.edu", "user_role": "student", "institution_id": "1", "admin_id": 8}));
}

#[test]
fn profile_update_only_sends_set_fields() {
    let update = ProfileUpdate { phone_number: Some("08012345678".to_owned()), ..ProfileUpdate::default() };
    assert!(!update.is_empty());
    assert_eq!(update.fields(), vec![("phone_number", "08012345678".to_owned())]);
    assert!(ProfileUpdate::default().is_empty());
}

#[test]
fn profile_update_nests_user_fields() {
    let update = ProfileUpdate {
        username: Some("maria".to_owned()),
        email: Some("maria@north.edu".to_owned()),
        phone_number: None,
    };
    let names: Vec<&str> = update.fields().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["user[username]", "user[email]"]);
}
