//! # Error Types: Verification Error Taxonomy
//!
//! Defines the error values produced by every stage of badge verification.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Every failure carries a distinct [`ErrorCode`] plus a human-readable
//!   message. Codes serialize to stable kebab-case strings (`http-status`,
//!   `jws-algorithm`, ...).
//! - Fetch failures keep the field path, attempted URL, and expected vs
//!   received values.
//! - Aggregating errors (`structure`, `resources`,
//!   `invalid-extension-structure`) hold one entry per sub-failure in
//!   `extra`, keyed by field path or extension name.
//! - Results gathered before a fan-out stage failed (fetched resources,
//!   evaluated extensions) ride along in `partial`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Stable identifier for every failure mode of the verification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// Malformed or untyped argument.
    Input,
    /// Mandatory field or linked resource absent.
    Required,
    /// Transport-level failure.
    Unreachable,
    /// Non-2xx response after redirects.
    HttpStatus,
    /// MIME type mismatch.
    ContentType,
    /// Body is not valid JSON where JSON was required.
    Parse,
    /// Field-level validation failures.
    Structure,
    /// Linked-resource fetch failures.
    Resources,
    /// Malformed compact JWS.
    JwsDecode,
    /// JWS header declares a rejected algorithm.
    JwsAlgorithm,
    /// JWS payload is not a JSON object.
    JwsPayloadParse,
    /// `verify.type` disagrees with the verification path invoked.
    VerifyTypeMismatch,
    /// Signature does not validate against the issuer's public key.
    VerifySignature,
    /// Assertion appears on the issuer's revocation list.
    VerifyRevoked,
    /// Caller-supplied hosted copy differs from the fetched copy.
    DeepEqual,
    /// An extension failed context, type, or schema checks.
    InvalidExtensionStructure,
    /// The assertion generation is recognized but not verifiable.
    UnsupportedVersion,
}

impl ErrorCode {
    /// Returns the wire identifier of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Required => "required",
            Self::Unreachable => "unreachable",
            Self::HttpStatus => "http-status",
            Self::ContentType => "content-type",
            Self::Parse => "parse",
            Self::Structure => "structure",
            Self::Resources => "resources",
            Self::JwsDecode => "jws-decode",
            Self::JwsAlgorithm => "jws-algorithm",
            Self::JwsPayloadParse => "jws-payload-parse",
            Self::VerifyTypeMismatch => "verify-type-mismatch",
            Self::VerifySignature => "verify-signature",
            Self::VerifyRevoked => "verify-revoked",
            Self::DeepEqual => "deep-equal",
            Self::InvalidExtensionStructure => "invalid-extension-structure",
            Self::UnsupportedVersion => "unsupported-version",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation failure, possibly aggregating sub-failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{code}: {message}")]
pub struct ValidationError {
    /// Failure category.
    pub code: ErrorCode,
    /// Dotted field path or scope the failure applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// URL involved in the failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Per-key detail for aggregating errors.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, BadgeError>,
    /// Successful results of the failing stage, keyed by stage output name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub partial: BTreeMap<String, Value>,
}

impl ValidationError {
    /// Create an error with a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            field: None,
            message: message.into(),
            url: None,
            extra: BTreeMap::new(),
            partial: BTreeMap::new(),
        }
    }

    /// Shorthand for an `input` error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Input, message)
    }

    /// Attach the field path this error applies to.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach the URL involved in the failure.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Replace the `extra` detail map.
    pub fn with_extra(mut self, extra: BTreeMap<String, BadgeError>) -> Self {
        self.extra = extra;
        self
    }

    /// Add one sub-failure to `extra`.
    pub fn with_detail(mut self, key: impl Into<String>, detail: impl Into<BadgeError>) -> Self {
        self.extra.insert(key.into(), detail.into());
        self
    }

    /// Look up a sub-failure by key.
    pub fn detail(&self, key: &str) -> Option<&BadgeError> {
        self.extra.get(key)
    }

    /// Keep what the stage produced before it failed.
    ///
    /// Values that do not serialize are recorded as `null`.
    pub fn with_partial(mut self, key: impl Into<String>, value: &impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.partial.insert(key.into(), value);
        self
    }

    /// Look up a partial result by key.
    pub fn partial(&self, key: &str) -> Option<&Value> {
        self.partial.get(key)
    }
}

/// A failed resource fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchError {
    /// Failure category (`required`, `unreachable`, `http-status`,
    /// `content-type`, or `parse`).
    pub code: ErrorCode,
    /// Dotted field path the URL was read from.
    pub field: String,
    /// The URL that was attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Expected status or content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Received status or content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    /// Underlying transport or parser message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FetchError {
    /// Create a fetch error for a field.
    pub fn new(code: ErrorCode, field: impl Into<String>) -> Self {
        Self {
            code,
            field: field.into(),
            url: None,
            expected: None,
            received: None,
            reason: None,
        }
    }

    /// Attach the attempted URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach expected and received values.
    pub fn with_mismatch(mut self, expected: impl Into<String>, received: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.received = Some(received.into());
        self
    }

    /// Attach the underlying reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Human-readable description built from the structured fields.
    pub fn message(&self) -> String {
        let url = self.url.as_deref().unwrap_or("<none>");
        match self.code {
            ErrorCode::Required => format!("missing required URL at `{}`", self.field),
            ErrorCode::Unreachable => format!(
                "could not reach {url}: {}",
                self.reason.as_deref().unwrap_or("unknown transport error")
            ),
            ErrorCode::HttpStatus | ErrorCode::ContentType => format!(
                "{url}: expected {}, received {}",
                self.expected.as_deref().unwrap_or("?"),
                self.received.as_deref().unwrap_or("?")
            ),
            ErrorCode::Parse => format!(
                "{url}: could not parse body as JSON: {}",
                self.reason.as_deref().unwrap_or("invalid JSON")
            ),
            other => format!("{other} at {url}"),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for `{}`: {}", self.code, self.field, self.message())
    }
}

impl std::error::Error for FetchError {}

/// Error side of every public operation.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BadgeError {
    /// Validation failure.
    #[error(transparent)]
    Validation(ValidationError),
    /// Fetch failure surfaced directly.
    #[error(transparent)]
    Fetch(FetchError),
}

impl BadgeError {
    /// Failure category.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => e.code,
            Self::Fetch(e) => e.code,
        }
    }

    /// Field path, if known.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation(e) => e.field.as_deref(),
            Self::Fetch(e) => Some(e.field.as_str()),
        }
    }

    /// URL involved, if known.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Validation(e) => e.url.as_deref(),
            Self::Fetch(e) => e.url.as_deref(),
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(e) => e.message.clone(),
            Self::Fetch(e) => e.message(),
        }
    }

    /// Sub-failure by key; only aggregating validation errors have any.
    pub fn detail(&self, key: &str) -> Option<&BadgeError> {
        match self {
            Self::Validation(e) => e.detail(key),
            Self::Fetch(_) => None,
        }
    }

    /// Borrow as a validation error.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Fetch(_) => None,
        }
    }

    /// Borrow as a fetch error.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            Self::Validation(_) => None,
            Self::Fetch(e) => Some(e),
        }
    }
}

impl From<ValidationError> for BadgeError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<FetchError> for BadgeError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_kebab_case() {
        let cases = [
            (ErrorCode::HttpStatus, "\"http-status\""),
            (ErrorCode::JwsPayloadParse, "\"jws-payload-parse\""),
            (ErrorCode::InvalidExtensionStructure, "\"invalid-extension-structure\""),
            (ErrorCode::DeepEqual, "\"deep-equal\""),
        ];
        for (code, expected) in cases {
            assert_eq!(serde_json::to_string(&code).unwrap(), expected);
            assert_eq!(format!("\"{code}\""), expected);
        }
    }

    #[test]
    fn aggregate_keeps_every_sub_failure() {
        let err = ValidationError::new(ErrorCode::Resources, "could not fetch linked resources")
            .with_detail(
                "badge.image",
                FetchError::new(ErrorCode::Unreachable, "badge.image")
                    .with_url("http://127.0.0.1:1/image.png")
                    .with_reason("connection refused"),
            )
            .with_detail(
                "issuer.url",
                FetchError::new(ErrorCode::HttpStatus, "issuer.url").with_mismatch("200", "404"),
            );

        assert_eq!(err.extra.len(), 2);
        assert_eq!(err.detail("badge.image").unwrap().code(), ErrorCode::Unreachable);
        assert_eq!(err.detail("issuer.url").unwrap().code(), ErrorCode::HttpStatus);
    }

    #[test]
    fn fetch_error_message_names_url_and_reason() {
        let err = FetchError::new(ErrorCode::Unreachable, "verify.url")
            .with_url("http://nowhere.invalid/key.pem")
            .with_reason("dns error");
        let msg = err.to_string();
        assert!(msg.contains("verify.url"));
        assert!(msg.contains("http://nowhere.invalid/key.pem"));
        assert!(msg.contains("dns error"));
    }

    #[test]
    fn badge_error_serializes_without_wrapper() {
        let err: BadgeError = ValidationError::input("not a string or object").into();
        let val = serde_json::to_value(&err).unwrap();
        assert_eq!(val["code"], "input");
        assert_eq!(val["message"], "not a string or object");
        assert!(val.get("extra").is_none());
        assert!(val.get("partial").is_none());
        assert!(val.get("Validation").is_none());
    }

    #[test]
    fn partial_results_serialize_next_to_failures() {
        let done = BTreeMap::from([("badge.image".to_string(), true)]);
        let err = ValidationError::new(ErrorCode::Resources, "could not fetch linked resources")
            .with_detail("issuer.url", FetchError::new(ErrorCode::HttpStatus, "issuer.url"))
            .with_partial("resources", &done);

        assert_eq!(err.partial("resources"), Some(&serde_json::json!({"badge.image": true})));
        let val = serde_json::to_value(&err).unwrap();
        assert_eq!(val["partial"]["resources"]["badge.image"], true);
        assert_eq!(val["extra"]["issuer.url"]["code"], "http-status");
    }

    #[test]
    fn nested_detail_lookup() {
        let inner = ValidationError::new(ErrorCode::Structure, "invalid badge")
            .with_detail("criteria", ValidationError::new(ErrorCode::Required, "missing required field").with_field("criteria"));
        let outer: BadgeError = ValidationError::new(ErrorCode::Structure, "could not validate")
            .with_detail("badge", inner)
            .into();

        let criteria = outer.detail("badge").and_then(|b| b.detail("criteria")).unwrap();
        assert_eq!(criteria.code(), ErrorCode::Required);
        assert_eq!(criteria.field(), Some("criteria"));
    }
}
