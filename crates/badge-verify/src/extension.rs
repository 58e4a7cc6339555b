//! # Extension Validation
//!
//! Finds the extensions embedded in an assertion and validates each one
//! independently and concurrently:
//!
//! 1. `type` is an array of strings.
//! 2. `@context` is an absolute URL; the context document is fetched and
//!    handed to the [`ContextExpander`], which loads the contexts it
//!    imports, reads its validation entries and expands `type`.
//! 3. At least one expanded `type` matches an entry's validated type.
//! 4. The matching schemas are fetched and validate the instance with
//!    `@context` and `type` removed.
//!
//! Failures aggregate into one `invalid-extension-structure` error keyed
//! by extension name.

use std::collections::BTreeMap;

use futures::future::join_all;
use serde_json::{Map, Value};

use badge_core::{ErrorCode, ValidationError};
use badge_fetch::{FetchSpec, Fetcher};
use badge_schema::{format, validate_instance, SchemaCheckError};

use crate::context::ContextExpander;

/// Per-extension outcome map: every evaluated extension maps to `true`.
pub type ExtensionMap = BTreeMap<String, bool>;

/// Whether a top-level property looks like an extension.
pub fn is_candidate(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.get("type").is_some_and(Value::is_array) || obj.get("@context").is_some()
    })
}

/// Names of the extensions embedded in an assertion.
pub fn candidates(assertion: &Value) -> Vec<&str> {
    assertion
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(k, v)| !k.starts_with('@') && is_candidate(v))
                .map(|(k, _)| k.as_str())
                .collect()
        })
        .unwrap_or_default()
}

/// Validate every extension of `assertion`.
pub async fn validate_extensions(
    fetcher: &Fetcher,
    expander: &dyn ContextExpander,
    assertion: &Value,
) -> (Option<ValidationError>, ExtensionMap) {
    let names = candidates(assertion);
    if names.is_empty() {
        return (None, ExtensionMap::new());
    }

    let jobs = names.iter().map(|name| async move {
        let outcome = match assertion.get(*name) {
            Some(instance) => validate_one(fetcher, expander, name, instance).await,
            None => Ok(()),
        };
        (name.to_string(), outcome)
    });

    let mut evaluated = ExtensionMap::new();
    let mut failures = BTreeMap::new();
    for (name, outcome) in join_all(jobs).await {
        evaluated.insert(name.clone(), true);
        if let Err(err) = outcome {
            failures.insert(name, err.into());
        }
    }

    if failures.is_empty() {
        tracing::debug!(count = evaluated.len(), "extensions valid");
        return (None, evaluated);
    }
    let err = ValidationError::new(
        ErrorCode::InvalidExtensionStructure,
        format!("{} of {} extension(s) failed validation", failures.len(), evaluated.len()),
    )
    .with_field("extensions")
    .with_extra(failures);
    (Some(err), evaluated)
}

fn invalid(name: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::new(ErrorCode::InvalidExtensionStructure, message).with_field(name)
}

async fn validate_one(
    fetcher: &Fetcher,
    expander: &dyn ContextExpander,
    name: &str,
    instance: &Value,
) -> Result<(), ValidationError> {
    let obj = instance
        .as_object()
        .ok_or_else(|| invalid(name, "extension must be a JSON object"))?;

    let types: Vec<&str> = match obj.get("type") {
        Some(Value::Array(items)) => items
            .iter()
            .map(Value::as_str)
            .collect::<Option<_>>()
            .ok_or_else(|| invalid(name, "`type` must be an array of strings"))?,
        Some(_) => return Err(invalid(name, "`type` must be an array of strings")),
        None => return Err(invalid(name, "extension must declare a `type` array")),
    };

    let context_url = obj
        .get("@context")
        .and_then(Value::as_str)
        .filter(|u| format::is_url(u))
        .ok_or_else(|| invalid(name, "`@context` must be an absolute URL"))?;

    let context = fetch_json(fetcher, name, "@context", context_url).await?;
    let resolved = expander
        .resolve(fetcher, context_url, &context, &types)
        .await
        .map_err(|reason| invalid(name, reason).with_url(context_url))?;

    let matching: Vec<_> = resolved.matching().collect();
    if matching.is_empty() {
        return Err(invalid(
            name,
            format!("no validation schema in {context_url} applies to type [{}]", types.join(", ")),
        )
        .with_url(context_url));
    }

    let body = Value::Object(strip_keywords(obj));
    let mut violations = BTreeMap::new();
    for descriptor in matching {
        let schema = fetch_json(fetcher, name, "schema", &descriptor.schema_url).await?;
        match validate_instance(&body, &schema) {
            Ok(()) => {}
            Err(SchemaCheckError::Invalid(found)) => {
                for v in found {
                    violations.insert(
                        v.key().to_string(),
                        ValidationError::new(ErrorCode::InvalidExtensionStructure, v.message.clone())
                            .with_field(v.key())
                            .with_url(&descriptor.schema_url)
                            .into(),
                    );
                }
            }
            Err(SchemaCheckError::Build(reason)) => {
                return Err(invalid(name, format!("extension schema is unusable: {reason}"))
                    .with_url(&descriptor.schema_url));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(invalid(name, format!("extension `{name}` does not match its schema")).with_extra(violations))
    }
}

async fn fetch_json(
    fetcher: &Fetcher,
    name: &str,
    what: &str,
    url: &str,
) -> Result<Value, ValidationError> {
    let field = format!("{name}.{what}");
    match fetcher.fetch(&FetchSpec::required(field.as_str(), Some(url)).as_json()).await {
        Ok(resource) => resource
            .into_json()
            .ok_or_else(|| invalid(name, format!("could not read {what} document")).with_url(url)),
        Err(e) => Err(invalid(name, format!("could not fetch {what} document"))
            .with_url(url)
            .with_detail(what, e)),
    }
}

fn strip_keywords(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .filter(|(k, _)| k.as_str() != "@context" && k.as_str() != "type")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
