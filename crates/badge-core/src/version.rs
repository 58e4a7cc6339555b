//! # Specification Versions and Verification Schemes
//!
//! The assertion format went through four mutually incompatible
//! generations. Each one is a variant here so every consumer matches on
//! them exhaustively; adding a generation forces every rule table and
//! dispatcher to handle it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Assertion specification version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecVersion {
    /// Legacy generation: snake_case fields, embedded badge and issuer,
    /// recipient as a single email or hash string.
    #[serde(rename = "0.5.0")]
    V0_5_0,
    /// First linked generation: badge and issuer referenced by URL,
    /// `verify` block naming the scheme.
    #[serde(rename = "1.0.0")]
    V1_0_0,
    /// 1.0.0 plus a JSON-LD `@context` and extensions.
    #[serde(rename = "1.1.0")]
    V1_1_0,
    /// Linked-data generation. Recognized, not verifiable.
    #[serde(rename = "2.0.0")]
    V2_0_0,
}

impl SpecVersion {
    /// Every known version, oldest first.
    pub const ALL: [SpecVersion; 4] = [
        SpecVersion::V0_5_0,
        SpecVersion::V1_0_0,
        SpecVersion::V1_1_0,
        SpecVersion::V2_0_0,
    ];

    /// Returns the dotted version string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V0_5_0 => "0.5.0",
            Self::V1_0_0 => "1.0.0",
            Self::V1_1_0 => "1.1.0",
            Self::V2_0_0 => "2.0.0",
        }
    }

    /// Whether assertions of this version can be verified.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::V2_0_0)
    }

    /// Whether this version belongs to the `verify`-block generation.
    pub fn is_v1(&self) -> bool {
        matches!(self, Self::V1_0_0 | Self::V1_1_0)
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('v') {
            "0.5.0" | "0.5" => Ok(Self::V0_5_0),
            "1.0.0" | "1.0" => Ok(Self::V1_0_0),
            "1.1.0" | "1.1" => Ok(Self::V1_1_0),
            "2.0.0" | "2.0" => Ok(Self::V2_0_0),
            other => Err(ValidationError::input(format!("unknown specification version `{other}`"))
                .with_field("version")),
        }
    }
}

/// How authenticity of an assertion is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    /// Re-fetch the assertion from its canonical URL and compare.
    Hosted,
    /// Verify a JWS signature over the assertion.
    Signed,
}

impl SchemeKind {
    /// Returns the `verify.type` spelling of this scheme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::Signed => "signed",
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hosted" => Ok(Self::Hosted),
            "signed" => Ok(Self::Signed),
            other => Err(ValidationError::input(format!("unknown verification scheme `{other}`"))
                .with_field("verify.type")),
        }
    }
}

/// The shape the caller handed in.
///
/// Inputs matching none of these are rejected with an `input` error
/// during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepresentationKind {
    /// A JSON object or a string holding one.
    Json,
    /// An absolute URL to dereference.
    Url,
    /// A compact JWS.
    SignedToken,
}
