//! Relative URL resolution for legacy assertions.
//!
//! 0.5.0 assertions may give `evidence`, `badge.criteria` and `badge.image`
//! as paths relative to `badge.issuer.origin`. Later generations require
//! absolute URLs and pass through unchanged.

use serde_json::Value;
use url::Url;

use badge_schema::{format, lookup};

use crate::classify::{resolve_generation, Generation};

/// Fields that may be relative in a legacy assertion.
pub const RELATIVE_FIELDS: [&str; 3] = ["evidence", "badge.criteria", "badge.image"];

/// Resolve relative legacy URLs against the issuer origin.
///
/// Absolute URLs, data URLs, and assertions of any other generation are
/// returned as they are, so applying this twice changes nothing.
pub fn absolutize(assertion: &Value) -> Value {
    let mut out = assertion.clone();
    if !matches!(resolve_generation(assertion), Ok(Generation::Legacy)) {
        return out;
    }
    let Some(origin) = lookup(assertion, "badge.issuer.origin")
        .and_then(Value::as_str)
        .and_then(|o| Url::parse(o).ok())
    else {
        return out;
    };

    for field in RELATIVE_FIELDS {
        let Some(relative) = lookup(assertion, field)
            .and_then(Value::as_str)
            .filter(|s| format::is_relative_path(s))
        else {
            continue;
        };
        if let Ok(joined) = origin.join(relative) {
            set(&mut out, field, Value::String(joined.into()));
        }
    }
    out
}

fn set(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            if let Some(obj) = node.as_object_mut() {
                obj.insert(segment.to_string(), value);
            }
            return;
        }
        match node.get_mut(segment) {
            Some(next) => node = next,
            None => return,
        }
    }
}
