#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use chrono::Duration;
use tower::ServiceExt;

use mercato_api::app::{
    AppParts, build_app,
    services::{InMemoryDirectory, Order},
};
use mercato_auth::{IdentityClaim, Role, TokenCodec};
use mercato_core::AppConfig;

pub const SECRET: &str = "integration-signing-secret-0123456789";

pub fn config_with(pairs: &[(&str, &str)]) -> AppConfig {
    let mut map: HashMap<String, String> = HashMap::from([
        ("APP_ENV".to_string(), "test".to_string()),
        ("JWT_SECRET".to_string(), SECRET.to_string()),
    ]);
    for (k, v) in pairs {
        map.insert(k.to_string(), v.to_string());
    }
    AppConfig::from_source(move |key| map.get(key).cloned()).unwrap()
}

pub fn config() -> AppConfig {
    config_with(&[])
}

pub fn codec() -> TokenCodec {
    let cfg = config();
    TokenCodec::new(&cfg.auth, cfg.mode)
}

pub fn claim(user_id: &str, role: Role) -> IdentityClaim {
    IdentityClaim::new(user_id, format!("{user_id}@example.com"), role)
}

pub fn token_for(user_id: &str, role: Role) -> String {
    codec().issue(&claim(user_id, role), Duration::hours(1)).unwrap()
}

pub fn directory() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_order(Order {
            id: "o-1".to_string(),
            buyer_id: "buyer-1".to_string(),
            seller_id: "seller-1".to_string(),
            listing_id: "l-9".to_string(),
            quantity: 3,
        })
        .with_user("admin-1")
        .with_user("buyer-1")
}

pub fn app() -> Router {
    build_app(&config(), Arc::new(directory()))
}

pub fn app_from(parts: AppParts) -> Router {
    mercato_api::app::router(parts)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

pub async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    TestResponse { status, headers, body }
}

pub async fn text(app: &Router, req: Request<Body>) -> String {
    let res = app.clone().oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_auth(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", authorization)
        .body(Body::empty())
        .unwrap()
}

pub fn bearer(uri: &str, token: &str) -> Request<Body> {
    get_with_auth(uri, &format!("Bearer {token}"))
}
