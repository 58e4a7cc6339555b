//! # Signatures and GUIDs
//!
//! Signature checks delegate to `badge-crypto`; this module adds the
//! assertion-level pieces: the origin of `verify.url` and the
//! deterministic assertion GUID.

use serde_json::Value;
use url::Url;

use badge_core::{AssertionGuid, BadgeError, ErrorCode, ValidationError};
use badge_schema::{format, lookup};

use crate::classify::{resolve_generation, Generation};

/// Whether `token` is signed by the key in `public_key_pem`.
///
/// Only RSA-family algorithms verify. An unparsable key, a malformed token
/// or an HMAC header yields `false`.
pub fn verify_signature(token: &str, public_key_pem: &str) -> bool {
    badge_crypto::verify(token, public_key_pem)
}

/// The `verify-signature` failure.
pub fn signature_error(key_url: &str) -> ValidationError {
    ValidationError::new(
        ErrorCode::VerifySignature,
        "signature could not be verified with the issuer's public key",
    )
    .with_field("verify.url")
    .with_url(key_url)
}

/// `scheme://host[:port]` of a URL.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host()?;
    Some(parsed.origin().ascii_serialization())
}

/// Deterministic GUID of an assertion.
///
/// `input` may be a hosted assertion URL, a compact JWS, or an assertion
/// object. Objects use `verify.url` as the canonical URL (hosted) or key
/// URL (signed).
///
/// # Errors
///
/// - `input` when the input has no canonical identity, e.g. a legacy
///   object with no URL.
/// - Token decode errors for malformed JWS strings.
pub fn assertion_guid(input: &Value) -> Result<AssertionGuid, BadgeError> {
    let assertion = match input {
        Value::String(s) if format::is_url(s.trim()) => {
            return Ok(AssertionGuid::hosted(s.trim()));
        }
        Value::String(s) => badge_crypto::decode(s.trim())
            .map_err(ValidationError::from)?
            .payload,
        Value::Object(_) => input.clone(),
        _ => return Err(ValidationError::input("input must be a string or an object").into()),
    };

    let verify_url = lookup(&assertion, "verify.url").and_then(Value::as_str);
    match resolve_generation(&assertion)? {
        Generation::SignedV1(_) => {
            let uid = lookup(&assertion, "uid")
                .and_then(Value::as_str)
                .ok_or_else(|| ValidationError::input("signed assertion has no `uid`").with_field("uid"))?;
            let origin = verify_url.and_then(origin_of).ok_or_else(|| {
                ValidationError::input("signed assertion has no valid `verify.url`").with_field("verify.url")
            })?;
            Ok(AssertionGuid::signed(uid, &origin))
        }
        Generation::HostedV1(_) => verify_url
            .filter(|u| format::is_url(u))
            .map(AssertionGuid::hosted)
            .ok_or_else(|| {
                ValidationError::input("hosted assertion has no valid `verify.url`")
                    .with_field("verify.url")
                    .into()
            }),
        Generation::Legacy | Generation::LinkedDataV2 => Err(ValidationError::input(
            "assertion has no canonical URL; pass the URL it is hosted at",
        )
        .into()),
    }
}
