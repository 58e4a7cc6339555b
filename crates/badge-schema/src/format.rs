//! # Format Validators
//!
//! Leaf predicates over strings and JSON values. Each returns `bool`; the
//! rule engine in [`crate::structure`] turns failures into keyed errors.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use url::{ParseError, Url};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").unwrap());

/// `algorithm$hexdigest`, as produced by hashing a salted recipient.
static HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:md5|sha1|sha256|sha384|sha512)\$[0-9a-fA-F]+$").unwrap());

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+\.\d+(\.\d+)?$").unwrap());

static UNIX_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^1\d{9}$").unwrap());

static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^data:[a-z0-9!#$&^_.+-]*(/[a-z0-9!#$&^_.+-]+)?(;[^,]*)?,").unwrap());

/// An email address.
pub fn is_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// A hashed identity, e.g. `sha256$ab12...`.
pub fn is_hash(s: &str) -> bool {
    HASH_RE.is_match(s)
}

/// An absolute `http` or `https` URL with a host.
pub fn is_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

/// A `data:` URL.
pub fn is_data_url(s: &str) -> bool {
    DATA_URL_RE.is_match(s)
}

/// A relative reference such as `/criteria.html` or `badge.png`.
pub fn is_relative_path(s: &str) -> bool {
    !s.trim().is_empty()
        && !s.chars().any(char::is_whitespace)
        && matches!(Url::parse(s), Err(ParseError::RelativeUrlWithoutBase))
}

/// Scheme, host and optional port, with nothing after an optional `/`.
pub fn is_origin(s: &str) -> bool {
    match Url::parse(s) {
        Ok(u) => {
            matches!(u.scheme(), "http" | "https")
                && u.host().is_some()
                && u.path() == "/"
                && u.query().is_none()
                && u.fragment().is_none()
                && u.username().is_empty()
        }
        Err(_) => false,
    }
}

/// `v?N.N` or `v?N.N.N`.
pub fn is_version(s: &str) -> bool {
    VERSION_RE.is_match(s)
}

/// A point in time: a 10-digit Unix timestamp starting with `1` (string or
/// integer), or an ISO-8601 date or date-time.
///
/// Short digit strings such as `"2014"` are rejected: they read equally
/// well as a year or as a timestamp.
pub fn is_time(value: &Value) -> bool {
    match value {
        Value::Number(n) => n
            .as_u64()
            .is_some_and(|t| (1_000_000_000..=1_999_999_999).contains(&t)),
        Value::String(s) => is_time_str(s),
        _ => false,
    }
}

fn is_time_str(s: &str) -> bool {
    let s = s.trim();
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return UNIX_TIMESTAMP_RE.is_match(s);
    }
    is_iso_datetime(s)
}

/// ISO-8601 date or date-time, with or without an offset.
pub fn is_iso_datetime(s: &str) -> bool {
    if DateTime::parse_from_rfc3339(s).is_ok() {
        return true;
    }
    if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        return true;
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"]
            .iter()
            .any(|fmt| DateTime::parse_from_str(s, fmt).is_ok())
}
