//! Public structural checks across generations and roles.

use badge_core::{ErrorCode, SpecVersion};
use badge_schema::rules::table;
use badge_schema::{structure, Check, Presence, Role};
use serde_json::{json, Value};

const SUPPORTED: [SpecVersion; 3] = [SpecVersion::V0_5_0, SpecVersion::V1_0_0, SpecVersion::V1_1_0];
const ROLES: [Role; 3] = [Role::Assertion, Role::BadgeClass, Role::Issuer];
const HASH: &str = "sha256$c7ef86405ba71b85acd8e2e95166c4b111448089f2e1599f42fe1bba46e865c5";

fn issuer() -> serde_json::Value {
    json!({"name": "Example Issuer", "url": "https://issuer.example.org"})
}

#[test]
fn context_is_required_in_1_1_and_forbidden_in_1_0() {
    let plain = issuer();
    let mut with_context = issuer();
    with_context["@context"] = json!("https://w3id.org/openbadges/v1");

    assert!(structure::validate(&plain, SpecVersion::V1_0_0, Role::Issuer).unwrap().is_empty());
    let errors = structure::validate(&with_context, SpecVersion::V1_0_0, Role::Issuer).unwrap();
    assert!(errors.contains_key("@context"));

    assert!(structure::validate(&with_context, SpecVersion::V1_1_0, Role::Issuer).unwrap().is_empty());
    let errors = structure::validate(&plain, SpecVersion::V1_1_0, Role::Issuer).unwrap();
    assert_eq!(errors["@context"].code, ErrorCode::Required);
}

#[test]
fn issuer_optional_fields_are_format_checked() {
    let mut doc = issuer();
    doc["email"] = json!("not-an-email");
    doc["revocationList"] = json!("revoked.json");
    let errors = structure::validate(&doc, SpecVersion::V1_0_0, Role::Issuer).unwrap();
    assert_eq!(errors.keys().map(String::as_str).collect::<Vec<_>>(), vec!["email", "revocationList"]);
}

#[test]
fn badge_class_images_may_be_data_urls() {
    let badge = json!({
        "name": "Robotics",
        "description": "Built a robot.",
        "image": "data:image/png;base64,iVBORw0KGgo=",
        "criteria": "https://issuer.example.org/criteria",
        "issuer": "https://issuer.example.org/issuer.json",
        "tags": ["robots"]
    });
    assert!(structure::validate(&badge, SpecVersion::V1_0_0, Role::BadgeClass).unwrap().is_empty());
}

#[test]
fn legacy_linked_roles_have_no_rules() {
    let anything = json!({"whatever": 1});
    for role in [Role::BadgeClass, Role::Issuer] {
        assert!(structure::validate(&anything, SpecVersion::V0_5_0, role).unwrap().is_empty());
    }
}

#[test]
fn aggregated_error_is_keyed_by_role() {
    let errors = structure::validate(&json!({}), SpecVersion::V1_0_0, Role::BadgeClass).unwrap();
    let err = structure::into_error(Role::BadgeClass, errors).unwrap();
    assert_eq!(err.code, ErrorCode::Structure);
    assert_eq!(err.field.as_deref(), Some("badge"));
    assert_eq!(err.detail("criteria").unwrap().code(), ErrorCode::Required);
}

/// A document carrying every required and optional field of its table.
fn complete(version: SpecVersion, role: Role) -> Value {
    let mut doc = match (version, role) {
        (SpecVersion::V0_5_0, Role::Assertion) => json!({
            "recipient": HASH,
            "salt": "deadsea",
            "evidence": "/beths-robotics-work.html",
            "expires": "2030-01-01",
            "issued_on": "2011-06-01",
            "badge": {
                "version": "0.5.0",
                "name": "HTML5 Fundamental",
                "description": "Knows the difference between a <section> and an <article>",
                "image": "/img/html5-basic.png",
                "criteria": "https://example.org/badges/html5-basic",
                "issuer": {
                    "origin": "https://example.org",
                    "name": "P2PU",
                    "org": "School of Webcraft",
                    "contact": "admin@p2pu.org"
                }
            }
        }),
        (SpecVersion::V0_5_0, _) => json!({}),
        (_, Role::Assertion) => json!({
            "type": "Assertion",
            "id": "https://example.org/assertion.json",
            "uid": "abc123",
            "recipient": {"type": "email", "identity": HASH, "hashed": true, "salt": "deadsea"},
            "badge": "https://example.org/badge.json",
            "verify": {"type": "hosted", "url": "https://example.org/assertion.json"},
            "issuedOn": 1359217910,
            "expires": "2030-01-01T00:00:00Z",
            "evidence": "https://example.org/evidence",
            "image": "data:image/png;base64,iVBORw0KGgo="
        }),
        (_, Role::BadgeClass) => json!({
            "name": "Robotics",
            "description": "Built a robot.",
            "image": "https://example.org/badge.png",
            "criteria": "https://example.org/criteria",
            "issuer": "https://example.org/issuer.json",
            "alignment": [{"name": "CCSS.ELA-Literacy.RST.11-12.3"}],
            "tags": ["robots"]
        }),
        (_, Role::Issuer) => json!({
            "name": "Example Issuer",
            "url": "https://example.org",
            "description": "Issues robot badges.",
            "image": "https://example.org/issuer.png",
            "email": "badges@example.org",
            "revocationList": "https://example.org/revoked.json"
        }),
    };
    let obj = doc.as_object_mut().unwrap();
    match version {
        SpecVersion::V1_1_0 => {
            obj.insert("@context".into(), json!("https://w3id.org/openbadges/v1"));
        }
        SpecVersion::V1_0_0 if role == Role::Assertion => {
            obj.remove("type");
            obj.remove("id");
        }
        _ => {}
    }
    doc
}

fn split(path: &str) -> (String, &str) {
    match path.rsplit_once('.') {
        Some((parent, leaf)) => (format!("/{}", parent.replace('.', "/")), leaf),
        None => (String::new(), path),
    }
}

fn remove_at(doc: &mut Value, path: &str) {
    let (parent, leaf) = split(path);
    doc.pointer_mut(&parent).and_then(Value::as_object_mut).unwrap().remove(leaf);
}

fn set_at(doc: &mut Value, path: &str, value: Value) {
    let (parent, leaf) = split(path);
    doc.pointer_mut(&parent).and_then(Value::as_object_mut).unwrap().insert(leaf.into(), value);
}

/// A value no check accepts except the ones it is crafted against.
fn invalid_for(check: &Check) -> Value {
    match check {
        Check::Bool => json!("true"),
        _ => json!(42),
    }
}

fn errors(doc: &Value, version: SpecVersion, role: Role) -> Vec<(String, ErrorCode)> {
    structure::validate(doc, version, role)
        .unwrap()
        .into_iter()
        .map(|(path, err)| (path, err.code))
        .collect()
}

#[test]
fn complete_documents_pass() {
    for version in SUPPORTED {
        for role in ROLES {
            let doc = complete(version, role);
            assert_eq!(errors(&doc, version, role), vec![], "{version} {role}");
        }
    }
}

#[test]
fn every_rule_reports_under_its_own_path() {
    for version in SUPPORTED {
        for role in ROLES {
            for rule in table(version, role).unwrap() {
                let (version_role, path) = (format!("{version} {role}"), rule.path);
                let absent = match rule.presence {
                    Presence::Required => vec![(path.to_string(), ErrorCode::Required)],
                    Presence::Optional => vec![],
                    Presence::Forbidden => continue,
                };

                let mut removed = complete(version, role);
                remove_at(&mut removed, path);
                assert_eq!(errors(&removed, version, role), absent, "{version_role}: remove {path}");

                let mut nulled = complete(version, role);
                set_at(&mut nulled, path, Value::Null);
                assert_eq!(errors(&nulled, version, role), absent, "{version_role}: null {path}");

                let mut invalid = complete(version, role);
                set_at(&mut invalid, path, invalid_for(&rule.check));
                let found = structure::validate(&invalid, version, role).unwrap();
                assert_eq!(
                    found.keys().map(String::as_str).collect::<Vec<_>>(),
                    vec![path],
                    "{version_role}: invalid {path}"
                );
                assert_eq!(found[path].code, ErrorCode::Structure, "{version_role}: invalid {path}");
                assert_eq!(found[path].field.as_deref(), Some(path));
            }
        }
    }
}

#[test]
fn every_forbidden_rule_rejects_presence() {
    for version in SUPPORTED {
        for role in ROLES {
            for rule in table(version, role).unwrap().iter().filter(|r| r.presence == Presence::Forbidden) {
                let mut doc = complete(version, role);
                set_at(&mut doc, rule.path, json!("present"));
                assert_eq!(
                    errors(&doc, version, role),
                    vec![(rule.path.to_string(), ErrorCode::Structure)],
                    "{version} {role}: {}",
                    rule.path
                );
            }
        }
    }
}
