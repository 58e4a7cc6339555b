//! # badge-schema: Structural Validation
//!
//! Field-level validation of badge assertions, badge classes and issuers
//! across the incompatible specification versions.
//!
//! ## Format Validators (`format`)
//!
//! Leaf predicates: email, hashed identity, absolute URL, data URL,
//! relative path, origin, version string, and time.
//!
//! ## Rule Tables (`rules`)
//!
//! One static table per version and [`Role`]. Each [`Rule`] names a dotted
//! path, whether it is required, optional or forbidden, and the [`Check`]
//! its value must pass. Composite checks ([`Check::ArrayOf`],
//! [`Check::AnyOf`]) build on the leaf predicates.
//!
//! ## Engine (`structure`)
//!
//! [`structure::validate`] applies a table and returns per-field errors.
//! Versions without a table (2.0.0) yield `unsupported-version`.
//!
//! ## Extension Schemas (`extension`)
//!
//! [`extension::validate_instance`] checks extension instances against
//! third-party JSON Schemas with remote `$ref` retrieval disabled.
//!
//! ## Crate Policy
//!
//! - Depends only on `badge-core` internally.
//! - No network access. Linked documents are fetched elsewhere and passed
//!   in as values.

pub mod extension;
pub mod format;
pub mod rules;
pub mod structure;

pub use extension::{validate_instance, SchemaCheckError, Violation};
pub use rules::{Check, Presence, Role, Rule};
pub use structure::{lookup, FieldErrors};
