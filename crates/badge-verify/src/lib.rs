//! # badge-verify: Badge Assertion Verification
//!
//! The end-to-end pipeline for validating badge assertions of every
//! generation (0.5.0, 1.0.0, 1.1.0; 2.0.0 is recognized and rejected).
//!
//! - **Classification** (`classify.rs`): object, JSON text, URL or compact
//!   JWS in; assertion body, generation and scheme out.
//! - **Linked documents** (`linked.rs`): badge class and issuer, plus the
//!   images, criteria and evidence they reference, fetched concurrently.
//! - **Signatures** (`signature.rs`): RSA-family JWS verification and
//!   assertion GUIDs.
//! - **Revocation** (`revocation.rs`): issuer revocation lists.
//! - **Extensions** (`extension.rs`, `context.rs`): JSON-LD context
//!   processing and JSON Schema validation of embedded extensions.
//! - **Orchestration** (`validator.rs`): [`Validator`] ties the stages
//!   together and produces a [`ValidationReport`].
//!
//! ## Usage
//!
//! ```no_run
//! use badge_verify::{Validator, ValidatorConfig};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::new(ValidatorConfig::default())?;
//! let report = validator
//!     .validate(&json!("https://example.org/assertions/123.json"), None, None)
//!     .await?;
//! println!("{} assertion, guid {:?}", report.version, report.guid);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Policy
//!
//! - Network access goes through `badge-fetch` only.
//! - Every expected failure is a returned [`BadgeError`], never a panic.

pub mod absolutize;
pub mod classify;
pub mod context;
pub mod extension;
pub mod linked;
pub mod report;
pub mod revocation;
pub mod signature;
pub mod validator;

pub use absolutize::absolutize;
pub use classify::{is_signed_badge, resolve_generation, Generation, ResolvedInput};
pub use context::{ContextExpander, ExtensionDescriptor, JsonLdExpander, ResolvedContext};
pub use linked::LinkedStructures;
pub use report::ValidationReport;
pub use revocation::check_revoked;
pub use signature::{assertion_guid, verify_signature};
pub use validator::{Validator, ValidatorConfig};

pub use badge_core::{BadgeError, ErrorCode, FetchError, SchemeKind, SpecVersion, ValidationError};
