use super::*;
use std::collections::HashMap;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_nothing_is_set() {
    let cfg = AuthConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.timeouts, Timeouts::default());
    assert_eq!(
        cfg.timeouts,
        Timeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg.refresh_failure, RefreshFailurePolicy::Logout);
}

#[test]
fn parses_overrides() {
    let cfg = AuthConfig::from_lookup(lookup(&[
        ("CAMPUS_API_BASE_URL", " https://campus.example/api/ "),
        ("CAMPUS_REQUEST_TIMEOUT_SECS", "30"),
        ("CAMPUS_CONNECT_TIMEOUT_SECS", "2"),
        ("CAMPUS_REFRESH_FAILURE", "keep"),
    ]))
    .unwrap();
    assert_eq!(cfg.base_url, "https://campus.example/api/");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 30, connect_secs: 2 });
    assert_eq!(cfg.refresh_failure, RefreshFailurePolicy::KeepSession);
}

#[test]
fn invalid_or_zero_timeouts_fall_back() {
    let cfg = AuthConfig::from_lookup(lookup(&[
        ("CAMPUS_REQUEST_TIMEOUT_SECS", "soon"),
        ("CAMPUS_CONNECT_TIMEOUT_SECS", "0"),
    ]))
    .unwrap();
    assert_eq!(cfg.timeouts, Timeouts::default());
}

#[test]
fn rejects_non_http_base_url() {
    let err = AuthConfig::from_lookup(lookup(&[("CAMPUS_API_BASE_URL", "ftp://campus")])).unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG");
    assert!(AuthConfig::with_base_url("localhost:8000").is_err());
}

#[test]
fn rejects_unknown_refresh_policy() {
    let err = AuthConfig::from_lookup(lookup(&[("CAMPUS_REFRESH_FAILURE", "retry")])).unwrap_err();
    assert!(matches!(err, AuthError::Config(msg) if msg.contains("retry")));
}

#[test]
fn with_base_url_uses_defaults() {
    let cfg = AuthConfig::with_base_url("http://localhost:9000/api").unwrap();
    assert_eq!(cfg.base_url, "http://localhost:9000/api");
    assert_eq!(cfg.refresh_failure, RefreshFailurePolicy::default());
}
