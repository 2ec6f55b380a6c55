use super::*;
use std::sync::Arc;

use auth::MemoryCredentialStore;

fn api() -> (ConsoleApi, SessionStore) {
    let config = AuthConfig::with_base_url("http://127.0.0.1:9/api/").unwrap();
    let context = SessionContext::from_config(&config, Arc::new(MemoryCredentialStore::new())).unwrap();
    (ConsoleApi::from_context(&context, &config).unwrap(), context.store().clone())
}

fn identity(role: Role, institution: Option<&str>, admin_id: Option<i64>) -> Identity {
    Identity {
        id: 1,
        username: None,
        email: "someone@north.edu".to_owned(),
        role,
        institution: institution.map(str::to_owned),
        teacher_id: None,
        student_id: None,
        admin_id,
        manager_id: None,
    }
}

#[test]
fn endpoint_paths_match_backend_routes() {
    assert_eq!(admins_list_endpoint("1"), "/manager/1/admins-list/");
    assert_eq!(users_list_endpoint("1"), "admin/1/teacher-student-list/");
    assert_eq!(admin_detail_endpoint("1", 8), "/manager/1/admin-detail/8/");
    assert_eq!(profile_endpoint("1"), "/manager/1/profile/");
}

#[tokio::test]
async fn calls_need_a_session() {
    let (api, _store) = api();
    let cancel = CancellationToken::new();
    assert_eq!(api.list_admins(&cancel).await.unwrap_err(), ConsoleError::NotLoggedIn);
    assert_eq!(api.create_admin("x@y.z", &cancel).await.unwrap_err(), ConsoleError::NotLoggedIn);
}

#[tokio::test]
async fn calls_need_an_institution() {
    let (api, store) = api();
    store.set_user(Some(identity(Role::Manager, None, None)));
    let err = api.profile(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, ConsoleError::MissingInstitution);
}

#[tokio::test]
async fn create_user_rejects_staff_roles() {
    let (api, store) = api();
    store.set_user(Some(identity(Role::Admin, Some("1"), Some(8))));
    let err = api.create_user("x@y.z", Role::Admin, &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, ConsoleError::UnsupportedRole(Role::Admin));
}

#[tokio::test]
async fn create_user_needs_admin_id() {
    let (api, store) = api();
    store.set_user(Some(identity(Role::Manager, Some("1"), None)));
    let err = api.create_user("x@y.z", Role::Teacher, &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, ConsoleError::MissingAdminId);
}

#[tokio::test]
async fn empty_profile_update_is_refused_locally() {
    let (api, store) = api();
    store.set_user(Some(identity(Role::Manager, Some("1"), None)));
    let err = api.update_profile(ProfileUpdate::default(), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, ConsoleError::EmptyUpdate);
}

#[tokio::test]
async fn canceled_call_reports_cancellation() {
    let (api, store) = api();
    store.set_user(Some(identity(Role::Manager, Some("1"), None)));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = api.list_admins(&cancel).await.unwrap_err();
    assert!(err.is_cancellation());
}
