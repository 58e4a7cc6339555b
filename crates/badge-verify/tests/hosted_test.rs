//! Hosted verification against a mock issuer site.

mod common;

use badge_core::AssertionGuid;
use badge_verify::{ErrorCode, SchemeKind, SpecVersion};
use common::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn hosted_url_validates_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();
    let url = format!("{base}/assertion.json");
    mount_json(&server, "/assertion.json", assertion(&base, "hosted", &url)).await;
    mount_linked(&server, badge_class(&base), issuer(&base)).await;

    let report = validator().validate(&json!(url), None, None).await.unwrap();

    assert_eq!(report.version, SpecVersion::V1_0_0);
    assert_eq!(report.scheme, SchemeKind::Hosted);
    assert_eq!(report.guid, Some(AssertionGuid::hosted(&url)));
    assert_eq!(report.structures.badge["name"], "Awesome Robotics Badge");
    assert_eq!(report.structures.issuer["email"], "steved@example.org");
    assert_eq!(
        report.resources.keys().map(String::as_str).collect::<Vec<_>>(),
        vec![
            "assertion.evidence",
            "assertion.image",
            "badge.criteria",
            "badge.image",
            "issuer.image",
            "issuer.url"
        ]
    );
    assert!(report.extensions.is_empty());
    assert!(report.token.is_none());
}

#[tokio::test]
async fn supplied_object_matching_hosted_copy_passes() {
    let server = MockServer::start().await;
    let base = server.uri();
    let url = format!("{base}/assertion.json");
    let body = assertion(&base, "hosted", &url);
    mount_json(&server, "/assertion.json", body.clone()).await;
    mount_linked(&server, badge_class(&base), issuer(&base)).await;

    let report = validator().validate_hosted(&body).await.unwrap();
    assert_eq!(report.guid, Some(AssertionGuid::hosted(&url)));

    // Same result through the JSON-text representation.
    let text = json!(serde_json::to_string(&body).unwrap());
    assert!(validator().validate(&text, Some(SpecVersion::V1_0_0), Some(SchemeKind::Hosted)).await.is_ok());
}

#[tokio::test]
async fn supplied_object_differing_from_hosted_copy_fails_deep_equal() {
    let server = MockServer::start().await;
    let base = server.uri();
    let url = format!("{base}/assertion.json");
    let hosted = assertion(&base, "hosted", &url);
    mount_json(&server, "/assertion.json", hosted.clone()).await;
    mount_linked(&server, badge_class(&base), issuer(&base)).await;

    let mut tampered = hosted;
    tampered["recipient"]["identity"] = json!("sha256$00");
    let err = validator().validate_hosted(&tampered).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::DeepEqual);
    assert_eq!(err.url(), Some(url.as_str()));
}

#[tokio::test]
async fn badge_without_criteria_is_keyed_under_badge() {
    let server = MockServer::start().await;
    let base = server.uri();
    let url = format!("{base}/assertion.json");
    mount_json(&server, "/assertion.json", assertion(&base, "hosted", &url)).await;
    let mut badge = badge_class(&base);
    badge.as_object_mut().unwrap().remove("criteria");
    mount_linked(&server, badge, issuer(&base)).await;

    let err = validator().validate(&json!(url), None, None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Structure);
    let badge_err = err.detail("badge").expect("badge findings");
    assert_eq!(badge_err.code(), ErrorCode::Structure);
    let criteria = badge_err.detail("criteria").expect("criteria finding");
    assert_eq!(criteria.code(), ErrorCode::Required);
    assert!(err.detail("assertion").is_none());
    assert!(err.detail("issuer").is_none());
}

#[tokio::test]
async fn invalid_assertion_stops_before_linked_documents_are_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    let url = format!("{base}/assertion.json");
    let mut body = assertion(&base, "hosted", &url);
    body["issuedOn"] = json!("2014");
    mount_json(&server, "/assertion.json", body).await;
    Mock::given(method("GET"))
        .and(path("/badge.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(badge_class(&base)))
        .expect(0)
        .mount(&server)
        .await;

    let err = validator().validate(&json!(url), None, None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Structure);
    let own = err.detail("assertion").expect("assertion findings");
    assert_eq!(own.detail("issuedOn").unwrap().code(), ErrorCode::Structure);
    assert!(err.detail("badge").is_none());
}

#[tokio::test]
async fn unreachable_issuer_is_reported_under_issuer() {
    let server = MockServer::start().await;
    let base = server.uri();
    let url = format!("{base}/assertion.json");
    mount_json(&server, "/assertion.json", assertion(&base, "hosted", &url)).await;
    let mut badge = badge_class(&base);
    badge["issuer"] = json!(format!("{UNREACHABLE}/issuer.json"));
    mount_json(&server, "/badge.json", badge).await;

    let err = validator().validate(&json!(url), None, None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Structure);
    let issuer_err = err.detail("issuer").unwrap();
    assert_eq!(issuer_err.code(), ErrorCode::Unreachable);
    assert_eq!(issuer_err.field(), Some("issuer"));
}

#[tokio::test]
async fn failed_resources_aggregate_by_key() {
    let server = MockServer::start().await;
    let base = server.uri();
    let url = format!("{base}/assertion.json");
    mount_json(&server, "/assertion.json", assertion(&base, "hosted", &url)).await;
    mount_json(&server, "/badge.json", badge_class(&base)).await;
    mount_json(&server, "/issuer.json", issuer(&base)).await;
    mount_status(&server, "/badge.png", 404).await;
    mount_raw(&server, "/issuer.png", "GIF89a", "image/gif").await;
    mount_raw(&server, "/assertion.png", PNG, "image/png").await;
    mount_raw(&server, "/criteria", "ok", "text/html").await;
    mount_raw(&server, "/evidence", "ok", "text/html").await;
    mount_raw(&server, "/", "ok", "text/html").await;

    let err = validator().validate(&json!(url), None, None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Resources);
    let extra = &err.as_validation().unwrap().extra;
    assert_eq!(extra.keys().map(String::as_str).collect::<Vec<_>>(), vec!["badge.image", "issuer.image"]);
    let image = extra["badge.image"].as_fetch().unwrap();
    assert_eq!(image.code, ErrorCode::HttpStatus);
    assert_eq!(image.received.as_deref(), Some("404"));
    assert_eq!(extra["issuer.image"].code(), ErrorCode::ContentType);
}

#[tokio::test]
async fn resources_error_keeps_the_fetches_that_succeeded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let url = format!("{base}/assertion.json");
    mount_json(&server, "/assertion.json", assertion(&base, "hosted", &url)).await;
    mount_json(&server, "/badge.json", badge_class(&base)).await;
    mount_json(&server, "/issuer.json", issuer(&base)).await;
    mount_status(&server, "/badge.png", 404).await;
    mount_raw(&server, "/issuer.png", PNG, "image/png").await;
    mount_raw(&server, "/assertion.png", PNG, "image/png").await;
    mount_raw(&server, "/criteria", "<h1>Criteria</h1>", "text/html").await;
    mount_raw(&server, "/evidence", "<h1>Evidence</h1>", "text/html").await;
    mount_raw(&server, "/", "<h1>Issuer</h1>", "text/html").await;

    let err = validator().validate(&json!(url), None, None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Resources);
    let failure = err.as_validation().unwrap();
    assert_eq!(failure.extra.keys().map(String::as_str).collect::<Vec<_>>(), vec!["badge.image"]);
    let fetched = failure.partial("resources").and_then(|v| v.as_object()).unwrap();
    assert_eq!(
        fetched.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["assertion.evidence", "assertion.image", "badge.criteria", "issuer.image", "issuer.url"]
    );
    assert_eq!(fetched["issuer.image"]["contentType"], "image/png");
    assert_eq!(fetched["issuer.image"]["size"], PNG.len());
}

#[tokio::test]
async fn unreachable_assertion_url_surfaces_fetch_error() {
    let url = format!("{UNREACHABLE}/assertion.json");
    let err = validator().validate(&json!(url), None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unreachable);
    assert_eq!(err.url(), Some(url.as_str()));
}

#[tokio::test]
async fn legacy_assertion_resolves_relative_urls() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_raw(&server, "/img/html5-basic.png", PNG, "image/png").await;
    mount_raw(&server, "/badges/html5-basic", "criteria", "text/html").await;
    mount_raw(&server, "/work/alice.html", "evidence", "text/html").await;

    let legacy = json!({
        "recipient": "alice@example.org",
        "evidence": "/work/alice.html",
        "issued_on": "2011-06-01",
        "badge": {
            "version": "0.5.0",
            "name": "HTML5 Fundamental",
            "image": "/img/html5-basic.png",
            "description": "Knows the difference between a <section> and an <article>",
            "criteria": "/badges/html5-basic",
            "issuer": {"origin": base, "name": "P2PU"}
        }
    });

    let report = validator().validate(&legacy, None, None).await.unwrap();

    assert_eq!(report.version, SpecVersion::V0_5_0);
    assert_eq!(report.scheme, SchemeKind::Hosted);
    assert!(report.guid.is_none());
    assert_eq!(report.assertion["badge"]["image"], format!("{base}/img/html5-basic.png"));
    assert_eq!(report.structures.issuer["name"], "P2PU");
    assert_eq!(report.resources["badge.image"].bytes(), Some(PNG));
    assert!(report.resources["evidence"].text().is_some());
}

#[tokio::test]
async fn legacy_assertion_with_missing_image_fails_resources() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_raw(&server, "/criteria", "criteria", "text/html").await;

    let legacy = json!({
        "recipient": "alice@example.org",
        "badge": {
            "version": "0.5.0",
            "name": "HTML5 Fundamental",
            "image": "/missing.png",
            "description": "desc",
            "criteria": "/criteria",
            "issuer": {"origin": base, "name": "P2PU"}
        }
    });

    let err = validator().validate(&legacy, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Resources);
    assert!(err.detail("badge.image").is_some());
    assert!(err.detail("evidence").is_none());
}
