#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, LazyLock};
use tower::ServiceExt;
use tradejournal::adapters::sqlite_adapter::SqliteAdapter;
use tradejournal::adapters::web::{AppState, build_router};
use tradejournal::domain::user::User;
use tradejournal::ports::config_port::ConfigPort;
use tradejournal::ports::user_port::UserPort;

pub const TEST_PASSWORD: &str = "testpass123";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub static TEST_PASSWORD_HASH: LazyLock<String> = LazyLock::new(|| {
    use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
    let salt = SaltString::from_b64("dGVzdHNhbHR0ZXN0c2FsdA").unwrap();
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    argon2
        .hash_password(TEST_PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string()
});

pub struct MockConfigPort;

impl ConfigPort for MockConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("auth", "session_secret") => Some(
                "00000000000000000000000000000001\
                 00000000000000000000000000000001\
                 00000000000000000000000000000001\
                 00000000000000000000000000000001"
                    .to_string(),
            ),
            ("database", "path") => Some(":memory:".to_string()),
            _ => None,
        }
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match (section, key) {
            ("auth", "session_lifetime") => 3600,
            _ => default,
        }
    }

    fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
        default
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteAdapter>,
    pub alice: User,
    pub bob: User,
}

pub fn memory_store() -> Arc<SqliteAdapter> {
    let store = SqliteAdapter::in_memory().unwrap();
    store.initialize_schema().unwrap();
    Arc::new(store)
}

/// Router over an in-memory store seeded with two users sharing a password.
pub fn create_test_app() -> TestApp {
    let store = memory_store();
    let alice = store.create_user(ALICE, &TEST_PASSWORD_HASH).unwrap();
    let bob = store.create_user(BOB, &TEST_PASSWORD_HASH).unwrap();

    let state = AppState {
        trades: store.clone(),
        users: store.clone(),
        config: Arc::new(MockConfigPort),
    };

    TestApp {
        router: build_router(state).unwrap(),
        store,
        alice,
        bob,
    }
}

pub fn extract_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

pub fn build_cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .map(|sc| sc.split(';').next().unwrap_or("").to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    let body = json!({ "username": username, "password": password });
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Logs in and returns the cookie header for subsequent requests.
pub async fn login(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(login_request(username, TEST_PASSWORD))
        .await
        .unwrap();
    assert!(
        response.status().is_success(),
        "login failed with {}",
        response.status()
    );
    build_cookie_header(&extract_cookies(&response))
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn closed_trade_body(asset: &str, entry: f64, exit: f64, size: f64) -> Value {
    json!({
        "cryptoName": asset,
        "entryDate": "2024-04-01T10:00",
        "exitDate": "2024-04-03T15:30",
        "entryPrice": entry,
        "exitPrice": exit,
        "positionSize": size,
        "reason": "Breakout with volume",
        "notes": "followed the plan",
    })
}

pub fn open_trade_body(asset: &str, entry: f64, size: f64) -> Value {
    json!({
        "cryptoName": asset,
        "entryDate": "2024-04-05",
        "entryPrice": entry.to_string(),
        "positionSize": size.to_string(),
        "reason": "Accumulating",
    })
}
