//! # badge-fetch: Resource Fetcher
//!
//! Resolves the URLs a badge assertion links to: badge classes, issuers,
//! images, criteria, evidence, public keys, revocation lists, extension
//! contexts and schemas.
//!
//! - **Single fetches** ([`Fetcher::fetch`]) return a [`Resource`] or a
//!   [`FetchError`] carrying the field path, URL, and expected vs received
//!   values.
//! - **Batches** ([`Fetcher::fetch_all`]) run every fetch concurrently,
//!   wait for all of them, and partition successes from failures. One
//!   failing fetch never cancels a sibling.
//! - **`data:` URIs** resolve locally without touching the network.
//!
//! ## Crate Policy
//!
//! This crate is the only path from badgecheck to the network. The
//! verification crates hand it [`FetchSpec`]s and never build HTTP
//! requests themselves.

pub mod config;
mod data_uri;
pub mod fetcher;
pub mod resource;

pub use config::{ConfigError, FetchConfig};
pub use fetcher::{BatchResult, FetchSpec, Fetcher};
pub use resource::Resource;

pub use badge_core::FetchError;
