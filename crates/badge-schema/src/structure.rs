//! # Structural Validation
//!
//! Runs a rule table over a JSON object and collects one error per
//! failing field path. Every rule is evaluated; rules under a missing or
//! failing parent are skipped so only the parent is reported.

use std::collections::BTreeMap;

use serde_json::Value;

use badge_core::{ErrorCode, SpecVersion, ValidationError};

use crate::rules::{table, Presence, Role, Rule};

/// Per-field failures, keyed by dotted path. Empty means valid.
pub type FieldErrors = BTreeMap<String, ValidationError>;

/// Resolve a dotted path. `null` counts as missing.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.get(segment))
        .filter(|v| !v.is_null())
}

/// Validate `instance` against the `(version, role)` table.
///
/// # Errors
///
/// - `unsupported-version` for 2.0.0.
/// - `structure` when `instance` is not a JSON object.
pub fn validate(
    instance: &Value,
    version: SpecVersion,
    role: Role,
) -> Result<FieldErrors, ValidationError> {
    let rules = table(version, role).ok_or_else(|| unsupported(version))?;
    if !instance.is_object() {
        return Err(ValidationError::new(
            ErrorCode::Structure,
            format!("{role} must be a JSON object"),
        )
        .with_field(role.as_str()));
    }
    Ok(apply(instance, version, rules))
}

/// The error returned for versions without rule tables.
pub fn unsupported(version: SpecVersion) -> ValidationError {
    ValidationError::new(
        ErrorCode::UnsupportedVersion,
        format!("assertions of version {version} cannot be validated"),
    )
    .with_field("version")
}

fn apply(instance: &Value, version: SpecVersion, rules: &[Rule]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    // Paths whose children must not be evaluated.
    let mut pruned: Vec<&str> = Vec::new();

    for rule in rules {
        if pruned.iter().any(|p| is_child(rule.path, p)) {
            continue;
        }

        match (lookup(instance, rule.path), rule.presence) {
            (None, Presence::Required) => {
                pruned.push(rule.path);
                errors.insert(
                    rule.path.to_string(),
                    ValidationError::new(
                        ErrorCode::Required,
                        rule.message
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("missing required field `{}`", rule.path)),
                    )
                    .with_field(rule.path),
                );
            }
            (None, _) => pruned.push(rule.path),
            (Some(_), Presence::Forbidden) => {
                errors.insert(
                    rule.path.to_string(),
                    ValidationError::new(
                        ErrorCode::Structure,
                        format!("`{}` is not allowed in version {version}", rule.path),
                    )
                    .with_field(rule.path),
                );
            }
            (Some(value), _) if !rule.check.matches(value) => {
                pruned.push(rule.path);
                errors.insert(
                    rule.path.to_string(),
                    ValidationError::new(
                        ErrorCode::Structure,
                        rule.message.map(str::to_string).unwrap_or_else(|| {
                            format!("invalid `{}`: expected {}", rule.path, rule.check.describe())
                        }),
                    )
                    .with_field(rule.path),
                );
            }
            (Some(_), _) => {}
        }
    }

    errors
}

fn is_child(path: &str, parent: &str) -> bool {
    path.len() > parent.len() + 1
        && path.starts_with(parent)
        && path.as_bytes()[parent.len()] == b'.'
}

/// Wrap per-field failures of one document into a `structure` error, or
/// `None` when there are none.
pub fn into_error(role: Role, errors: FieldErrors) -> Option<ValidationError> {
    if errors.is_empty() {
        return None;
    }
    let extra = errors.into_iter().map(|(k, v)| (k, v.into())).collect();
    Some(
        ValidationError::new(ErrorCode::Structure, format!("invalid {role}"))
            .with_field(role.as_str())
            .with_extra(extra),
    )
}
