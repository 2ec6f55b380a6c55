//! Console bindings against an in-process backend that records what it saw.

use std::sync::{Arc, Mutex};

use auth::{AuthConfig, CancellationToken, MemoryCredentialStore, Role, SessionContext};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use console::{ConsoleApi, LoadOutcome, ProfileUpdate, Resource};
use serde_json::{Value, json};

#[derive(Default)]
struct Seen {
    bodies: Mutex<Vec<(String, Value)>>,
}

impl Seen {
    fn record(&self, route: &str, body: Value) {
        self.bodies.lock().unwrap().push((route.to_owned(), body));
    }

    fn last(&self) -> (String, Value) {
        self.bodies.lock().unwrap().last().cloned().unwrap()
    }
}

fn token(role: &str, admin_id: Option<i64>) -> String {
    let claims = json!({
        "exp": auth::token::now_ms() / 1000 + 3600,
        "user_id": 3,
        "email": "staff@north.edu",
        "user_role": role,
        "institution": 1,
        "admin_id": admin_id,
    });
    format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).is_some_and(|v| v.starts_with("Bearer "))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Authentication credentials were not provided."}))).into_response()
}

async fn login(Json(body): Json<Value>) -> Json<Value> {
    let role = body["password"].as_str().unwrap_or("manager").to_owned();
    let admin_id = (role == "admin").then_some(8);
    Json(json!({
        "access": token(&role, admin_id),
        "refresh": "R1",
        "user": {"id": 3, "email": body["email"], "user_role": role, "institution": 1, "admin_id": admin_id},
    }))
}

async fn create_admin(State(seen): State<Arc<Seen>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.record("create-admin", body.clone());
    (StatusCode::CREATED, Json(json!({"id": 9, "email": body["email"]}))).into_response()
}

async fn create_user(State(seen): State<Arc<Seen>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.record("create-user", body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn admins_list(Path(institution): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "count": 1,
        "results": [{
            "id": 8,
            "user": {"id": 21, "email": "ad@north.edu", "username": "ad", "user_role": "admin", "institution": institution},
            "institution": institution,
            "image": null,
            "date": "2024-09-01",
        }],
    }))
    .into_response()
}

async fn users_list(Path(institution): Path<String>) -> Json<Value> {
    Json(json!({
        "count": 2,
        "results": [
            {"id": 4, "username": "t", "email": "t@north.edu", "user_role": "teacher", "institution_id": institution, "admin_id": 8},
            {"id": 5, "username": "s", "email": "s@north.edu", "user_role": "student", "institution_id": institution, "admin_id": 8},
        ],
    }))
}

async fn admin_detail(State(seen): State<Arc<Seen>>, Path((institution, admin)): Path<(String, i64)>) -> StatusCode {
    seen.record("admin-detail", json!({"institution": institution, "admin": admin}));
    StatusCode::NO_CONTENT
}

fn profile_json(phone: &str) -> Value {
    json!({
        "id": 1,
        "user": {"id": 3, "username": "maria", "email": "maria@north.edu"},
        "phone_number": phone,
        "institution": 1,
    })
}

async fn profile() -> Json<Value> {
    Json(profile_json("08000000000"))
}

async fn patch_profile(State(seen): State<Arc<Seen>>, mut multipart: Multipart) -> Json<Value> {
    let mut fields = serde_json::Map::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        fields.insert(name, Value::String(field.text().await.unwrap()));
    }
    let phone = fields.get("phone_number").and_then(Value::as_str).unwrap_or("08000000000").to_owned();
    seen.record("profile", Value::Object(fields));
    Json(profile_json(&phone))
}

async fn spawn_backend() -> (AuthConfig, Arc<Seen>) {
    let seen = Arc::new(Seen::default());
    let app = Router::new()
        .route("/api/user/login/", post(login))
        .route("/api/manager/create-admin/", post(create_admin))
        .route("/api/admin/create-user/", post(create_user))
        .route("/api/manager/{institution}/admins-list/", get(admins_list))
        .route("/api/admin/{institution}/teacher-student-list/", get(users_list))
        .route("/api/manager/{institution}/admin-detail/{admin}/", delete(admin_detail))
        .route("/api/manager/{institution}/profile/", get(profile).patch(patch_profile))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (AuthConfig::with_base_url(&format!("http://{addr}/api/")).unwrap(), seen)
}

/// Log in as `role` (the fake backend reads the role from the password).
async fn console_as(config: &AuthConfig, role: &str) -> ConsoleApi {
    let context = SessionContext::from_config(config, Arc::new(MemoryCredentialStore::new())).unwrap();
    context.login("staff@north.edu", role).await.unwrap();
    ConsoleApi::from_context(&context, config).unwrap()
}

#[tokio::test]
async fn manager_admin_lifecycle() {
    let (config, seen) = spawn_backend().await;
    let api = console_as(&config, "manager").await;
    let cancel = CancellationToken::new();

    let created = api.create_admin("ad@north.edu", &cancel).await.unwrap();
    assert_eq!(created["id"], 9);
    assert_eq!(
        seen.last(),
        ("create-admin".to_owned(), json!({"email": "ad@north.edu", "institution_id": "1", "user_role": "admin"}))
    );

    let admins = api.list_admins(&cancel).await.unwrap();
    assert_eq!(admins.count, 1);
    assert_eq!(admins.results[0].user.email, "ad@north.edu");

    let ack = api.delete_admin(admins.results[0].id, &cancel).await.unwrap();
    assert_eq!(ack, Value::Null);
    assert_eq!(seen.last(), ("admin-detail".to_owned(), json!({"institution": "1", "admin": 8})));
}

#[tokio::test]
async fn manager_profile_read_and_multipart_update() {
    let (config, seen) = spawn_backend().await;
    let api = console_as(&config, "manager").await;
    let cancel = CancellationToken::new();

    let profile = api.profile(&cancel).await.unwrap();
    assert_eq!(profile.phone_number, "08000000000");

    let update = ProfileUpdate {
        username: Some("maria".to_owned()),
        phone_number: Some("08012345678".to_owned()),
        ..ProfileUpdate::default()
    };
    let updated = api.update_profile(update, &cancel).await.unwrap();
    assert_eq!(updated.phone_number, "08012345678");
    assert_eq!(
        seen.last(),
        ("profile".to_owned(), json!({"user[username]": "maria", "phone_number": "08012345678"}))
    );
}

#[tokio::test]
async fn admin_creates_and_lists_users() {
    let (config, seen) = spawn_backend().await;
    let api = console_as(&config, "admin").await;
    let cancel = CancellationToken::new();

    api.create_user("s@north.edu", Role::Student, &cancel).await.unwrap();
    assert_eq!(
        seen.last(),
        (
            "create-user".to_owned(),
            json!({"email": "s@north.edu", "user_role": "student", "institution_id": "1", "admin_id": 8})
        )
    );

    let users = api.list_users(&cancel).await.unwrap();
    assert_eq!(users.count, 2);
    assert_eq!(users.results[1].user_role, Role::Student);
}

#[tokio::test]
async fn resource_tracks_console_loads() {
    let (config, _seen) = spawn_backend().await;
    let api = console_as(&config, "manager").await;
    let admins = Resource::new();

    let outcome = admins.load(api.list_admins(&CancellationToken::new()), &CancellationToken::new()).await;
    assert!(matches!(outcome, LoadOutcome::Loaded(ref list) if list.count == 1));
    assert_eq!(admins.data().map(|list| list.results.len()), Some(1));
    assert!(!admins.is_loading());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let before = admins.snapshot();
    assert_eq!(admins.load(api.list_admins(&cancel), &cancel).await, LoadOutcome::Canceled);
    assert_eq!(admins.snapshot(), before);
}
