//! # Extension Schema Validation
//!
//! Validates an extension instance against the JSON Schema its context
//! points to, using the `jsonschema` crate.
//!
//! Extension schemas come from arbitrary third parties. Remote `$ref`
//! retrieval is refused: every reference must resolve inside the schema
//! document itself, so validating one extension never triggers network
//! traffic outside the fetcher.

use std::fmt;

use jsonschema::{Retrieve, Uri};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Retriever that refuses every external reference.
struct NoRemoteRefs;

impl Retrieve for NoRemoteRefs {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("remote $ref retrieval is disabled: {}", uri.as_str()).into())
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON Pointer into the instance. Empty for the root.
    pub instance_path: String,
    /// JSON Pointer into the schema.
    pub schema_path: String,
    pub message: String,
}

impl Violation {
    /// Instance pointer, with `/` standing in for the root.
    pub fn key(&self) -> &str {
        if self.instance_path.is_empty() {
            "/"
        } else {
            &self.instance_path
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key(), self.message)
    }
}

/// Failure of [`validate_instance`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheckError {
    /// The instance does not conform to the schema.
    #[error("instance violates schema ({} violation(s))", .0.len())]
    Invalid(Vec<Violation>),

    /// The schema itself could not be compiled.
    #[error("schema could not be compiled: {0}")]
    Build(String),
}

/// Validate `instance` against `schema`.
///
/// # Errors
///
/// [`SchemaCheckError::Invalid`] lists every violation;
/// [`SchemaCheckError::Build`] reports an uncompilable schema, including
/// one that needs a remote `$ref`.
pub fn validate_instance(instance: &Value, schema: &Value) -> Result<(), SchemaCheckError> {
    let mut opts = jsonschema::options();
    opts.with_retriever(NoRemoteRefs);
    let validator = opts
        .build(schema)
        .map_err(|e| SchemaCheckError::Build(e.to_string()))?;

    let violations: Vec<Violation> = validator
        .iter_errors(instance)
        .map(|e| Violation {
            instance_path: e.instance_path.to_string(),
            schema_path: e.schema_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = violations.len(), "extension instance violates its schema");
        Err(SchemaCheckError::Invalid(violations))
    }
}
