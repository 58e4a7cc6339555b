//! # Assertion GUIDs
//!
//! A GUID is a deterministic, content-derived identifier for a validated
//! assertion. It is used for identity, display, and de-duplication only;
//! it is not a security token.
//!
//! - hosted: `sha256("hosted:" + canonical_url)`
//! - signed: `sha256("signed:" + uid + ":" + origin(verify.url))`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic identifier of an assertion, as 64 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssertionGuid(String);

impl AssertionGuid {
    /// GUID of a hosted assertion, keyed by its canonical URL.
    pub fn hosted(url: &str) -> Self {
        Self(sha256_hex(format!("hosted:{url}").as_bytes()))
    }

    /// GUID of a signed assertion, keyed by its `uid` and the origin of
    /// its `verify.url`.
    pub fn signed(uid: &str, origin: &str) -> Self {
        Self(sha256_hex(format!("signed:{uid}:{origin}").as_bytes()))
    }

    /// Borrow the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssertionGuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute a lowercase hex SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{b:02x}")).collect()
}
