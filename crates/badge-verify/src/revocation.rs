//! Revocation list checks.
//!
//! An issuer's revocation list is a JSON object mapping assertion `uid`s
//! to a revocation reason. Presence of the key is what matters; the value
//! only feeds the message.

use serde_json::Value;

use badge_core::{ErrorCode, ValidationError};

/// Check `assertion.uid` against a revocation list.
///
/// Returns `verify-revoked` when the uid is listed, `parse` when the list
/// is not a JSON object, and `None` otherwise.
pub fn check_revoked(list: &Value, assertion: &Value) -> Option<ValidationError> {
    let Some(entries) = list.as_object() else {
        return Some(
            ValidationError::new(ErrorCode::Parse, "revocation list must be a JSON object")
                .with_field("issuer.revocationList"),
        );
    };
    let uid = assertion.get("uid").and_then(Value::as_str)?;
    let reason = entries.get(uid)?;

    let message = match reason {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    tracing::info!(%uid, "assertion is revoked");
    Some(ValidationError::new(ErrorCode::VerifyRevoked, message).with_field("uid"))
}
