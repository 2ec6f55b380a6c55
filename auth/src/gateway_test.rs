use super::*;

#[test]
fn endpoints_resolve_under_api_root() {
    let base = "http://127.0.0.1:8000/api/";
    assert_eq!(join_url(base, LOGIN_ENDPOINT), "http://127.0.0.1:8000/api/user/login/");
    assert_eq!(join_url(base, REGISTER_ENDPOINT), "http://127.0.0.1:8000/api/user/register/");
    assert_eq!(join_url(base, REFRESH_ENDPOINT), "http://127.0.0.1:8000/api/user/refresh-token/");
}

#[test]
fn forgot_password_embeds_email() {
    assert_eq!(forgot_password_endpoint("a@b.com"), "/user/forgot-password/a@b.com/");
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let mut config = AuthConfig::with_base_url("http://127.0.0.1:9/api/").unwrap();
    config.timeouts.connect_secs = 1;
    config.timeouts.request_secs = 2;
    let gateway = HttpAuthGateway::new(&config).unwrap();
    let err = gateway.login("a@b.com", "pw").await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(_) | AuthError::Timeout), "got {err:?}");
}
