//! # badge-core: Foundational Types for badgecheck
//!
//! Every other crate in the workspace depends on `badge-core`; it depends on
//! nothing internal.
//!
//! ## Contents
//!
//! 1. **Error taxonomy** (`error.rs`). One [`ErrorCode`] enum names every
//!    failure mode of the verification pipeline. [`ValidationError`] and
//!    [`FetchError`] carry the structured detail, and [`BadgeError`] is the
//!    error side of every public operation. Aggregating errors keep each
//!    sub-failure in their `extra` map, so no diagnostic detail is lost.
//!
//! 2. **Versions and schemes** (`version.rs`). [`SpecVersion`] covers the
//!    four assertion generations, [`SchemeKind`] the two authenticity
//!    schemes, [`RepresentationKind`] the shape the caller handed in.
//!
//! 3. **GUIDs** (`digest.rs`). [`AssertionGuid`] is the deterministic,
//!    content-derived identity of a validated assertion.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `badge-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Expected failures are values, never panics.

pub mod digest;
pub mod error;
pub mod version;

// Re-export primary types for ergonomic imports.
pub use digest::{sha256_hex, AssertionGuid};
pub use error::{BadgeError, ErrorCode, FetchError, ValidationError};
pub use version::{RepresentationKind, SchemeKind, SpecVersion};
