//! Shared fixtures for the verification tests: a mock issuer site, badge
//! documents for each generation, and an RSA key pair.

#![allow(dead_code)]

use std::sync::OnceLock;

use badge_crypto::Algorithm;
use badge_fetch::FetchConfig;
use badge_verify::{Validator, ValidatorConfig};
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OB_CONTEXT: &str = "https://w3id.org/openbadges/v1";
pub const UNREACHABLE: &str = "http://127.0.0.1:1";
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn validator() -> Validator {
    Validator::new(ValidatorConfig {
        fetch: FetchConfig::local_mock(),
        ..ValidatorConfig::default()
    })
    .unwrap()
}

pub fn issuer_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
}

pub fn other_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
}

pub fn public_pem(key: &RsaPrivateKey) -> String {
    key.to_public_key().to_public_key_pem(LineEnding::LF).unwrap()
}

pub fn sign(payload: &Value) -> String {
    badge_crypto::sign(Algorithm::RS256, payload, issuer_key()).unwrap()
}

pub async fn mount_json(server: &MockServer, p: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_raw(server: &MockServer, p: &str, body: impl Into<Vec<u8>>, mime: &str) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into(), mime))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, p: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn with_context(mut doc: Value) -> Value {
    doc["@context"] = json!(OB_CONTEXT);
    doc
}

pub fn badge_class(base: &str) -> Value {
    json!({
        "name": "Awesome Robotics Badge",
        "description": "For doing awesome things with robots.",
        "image": format!("{base}/badge.png"),
        "criteria": format!("{base}/criteria"),
        "issuer": format!("{base}/issuer.json"),
        "tags": ["robots", "awesome"]
    })
}

pub fn issuer(base: &str) -> Value {
    json!({
        "name": "An Example Badge Issuer",
        "url": format!("{base}/"),
        "image": format!("{base}/issuer.png"),
        "email": "steved@example.org"
    })
}

pub fn assertion(base: &str, verify_type: &str, verify_url: &str) -> Value {
    json!({
        "uid": "abc123",
        "recipient": {
            "type": "email",
            "hashed": true,
            "salt": "deadsea",
            "identity": "sha256$c7ef86405ba71b85acd8e2e95166c4b111448089f2e1599f42fe1bba46e865c5"
        },
        "image": format!("{base}/assertion.png"),
        "evidence": format!("{base}/evidence"),
        "issuedOn": 1359217910,
        "badge": format!("{base}/badge.json"),
        "verify": {"type": verify_type, "url": verify_url}
    })
}

/// Mount the badge class, issuer, and every resource they reference.
pub async fn mount_linked(server: &MockServer, badge: Value, issuer: Value) {
    mount_json(server, "/badge.json", badge).await;
    mount_json(server, "/issuer.json", issuer).await;
    mount_raw(server, "/badge.png", PNG, "image/png").await;
    mount_raw(server, "/issuer.png", PNG, "image/png").await;
    mount_raw(server, "/assertion.png", PNG, "image/png").await;
    mount_raw(server, "/criteria", "<h1>Criteria</h1>", "text/html").await;
    mount_raw(server, "/evidence", "<h1>Evidence</h1>", "text/html").await;
    mount_raw(server, "/", "<h1>Issuer</h1>", "text/html").await;
}
