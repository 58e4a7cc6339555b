//! # badge-crypto: Token Primitives
//!
//! Decodes and verifies the compact JWS tokens carried by signed badge
//! assertions.
//!
//! - **JWS** (`jws.rs`): split, decode, and verify compact tokens.
//! - **Keys** (`key.rs`): RSA public keys from PEM text.
//!
//! ## Algorithm Policy
//!
//! Only RSA-family algorithms (`RS256`/`RS384`/`RS512`,
//! `PS256`/`PS384`/`PS512`) are accepted. Any `HS*` algorithm is rejected
//! at decode time regardless of key material: a verifier holding an RSA
//! public key must never treat it as an HMAC secret. `none` and every other
//! algorithm are rejected the same way.
//!
//! ## Crate Policy
//!
//! - Depends only on `badge-core` internally.
//! - Signing lives behind the `signing` feature.

pub mod jws;
pub mod key;

pub use jws::{decode, is_compact_jws, verify, Algorithm, DecodedJws, JwsError, JwsHeader};
pub use key::parse_public_key;

#[cfg(feature = "signing")]
pub use jws::sign;
