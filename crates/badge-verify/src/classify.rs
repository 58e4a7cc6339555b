//! # Input Classification and Version Resolution
//!
//! Turns whatever the caller handed in (an object, a JSON string, a URL,
//! or a compact JWS) into a [`ResolvedInput`]: the assertion body plus its
//! representation, generation and verification scheme.
//!
//! The generation is inferred from the shape of the assertion. A declared
//! version string is never trusted.

use serde::Serialize;
use serde_json::Value;

use badge_core::{BadgeError, ErrorCode, RepresentationKind, SchemeKind, SpecVersion, ValidationError};
use badge_fetch::{FetchSpec, Fetcher};
use badge_schema::{format, lookup};

/// Field key used when a URL input is dereferenced.
pub const INPUT_FIELD: &str = "assertion";

/// Assertion generation, as inferred from its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "generation", content = "version", rename_all = "kebab-case")]
pub enum Generation {
    /// 0.5.0: embedded badge and issuer, always hosted.
    Legacy,
    /// 1.0.0 or 1.1.0, verified by re-fetching.
    HostedV1(SpecVersion),
    /// 1.0.0 or 1.1.0, verified by signature.
    SignedV1(SpecVersion),
    /// 2.0.0. Recognized, not verifiable.
    LinkedDataV2,
}

impl Generation {
    pub fn version(&self) -> SpecVersion {
        match self {
            Self::Legacy => SpecVersion::V0_5_0,
            Self::HostedV1(v) | Self::SignedV1(v) => *v,
            Self::LinkedDataV2 => SpecVersion::V2_0_0,
        }
    }

    pub fn scheme(&self) -> SchemeKind {
        match self {
            Self::SignedV1(_) => SchemeKind::Signed,
            Self::Legacy | Self::HostedV1(_) | Self::LinkedDataV2 => SchemeKind::Hosted,
        }
    }
}

/// Infer the generation of an assertion body.
///
/// # Errors
///
/// `input` when the body is not an object, names an unknown
/// `verify.type`, or matches no generation.
pub fn resolve_generation(assertion: &Value) -> Result<Generation, ValidationError> {
    if !assertion.is_object() {
        return Err(ValidationError::input("assertion must be a JSON object"));
    }
    let has_context = lookup(assertion, "@context").is_some();

    if let Some(kind) = lookup(assertion, "verify.type") {
        let scheme = kind
            .as_str()
            .ok_or_else(|| ValidationError::input("`verify.type` must be a string").with_field("verify.type"))?
            .parse::<SchemeKind>()?;
        let version = if has_context { SpecVersion::V1_1_0 } else { SpecVersion::V1_0_0 };
        return Ok(match scheme {
            SchemeKind::Hosted => Generation::HostedV1(version),
            SchemeKind::Signed => Generation::SignedV1(version),
        });
    }

    if has_context {
        return Ok(Generation::LinkedDataV2);
    }

    if lookup(assertion, "badge").is_some_and(|b| b.is_object() && lookup(b, "issuer").is_some()) {
        return Ok(Generation::Legacy);
    }

    if lookup(assertion, "recipient.type").is_some() {
        return Ok(Generation::HostedV1(SpecVersion::V1_0_0));
    }
    if lookup(assertion, "recipient").is_some_and(Value::is_string) {
        return Ok(Generation::Legacy);
    }

    Err(ValidationError::input("unable to determine assertion version"))
}

/// A classified input. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInput {
    raw: Value,
    representation: RepresentationKind,
    generation: Generation,
    assertion: Value,
    token: Option<String>,
    source_url: Option<String>,
}

impl ResolvedInput {
    /// The value the caller passed in.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn representation(&self) -> RepresentationKind {
        self.representation
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn version(&self) -> SpecVersion {
        self.generation.version()
    }

    pub fn scheme(&self) -> SchemeKind {
        self.generation.scheme()
    }

    /// The assertion body.
    pub fn assertion(&self) -> &Value {
        &self.assertion
    }

    /// The compact JWS, for signed-token inputs.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The URL the assertion was fetched from, for URL inputs.
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// Fail unless the resolved version and scheme match the caller's
    /// expectations.
    ///
    /// # Errors
    ///
    /// `input` (field `version`) on a version mismatch,
    /// `verify-type-mismatch` on a scheme mismatch.
    pub fn expect(
        &self,
        version: Option<SpecVersion>,
        scheme: Option<SchemeKind>,
    ) -> Result<(), ValidationError> {
        if let Some(expected) = version.filter(|v| *v != self.version()) {
            return Err(ValidationError::input(format!(
                "expected a {expected} assertion, found {}",
                self.version()
            ))
            .with_field("version"));
        }
        if let Some(expected) = scheme.filter(|s| *s != self.scheme()) {
            return Err(type_mismatch(expected, self.scheme()));
        }
        Ok(())
    }
}

/// `verify-type-mismatch` between the path invoked and the assertion.
pub fn type_mismatch(invoked: SchemeKind, found: SchemeKind) -> ValidationError {
    ValidationError::new(
        ErrorCode::VerifyTypeMismatch,
        format!("expected a {invoked} assertion, but `verify.type` resolves to {found}"),
    )
    .with_field("verify.type")
}

/// Classify a raw input, dereferencing it when it is a URL.
///
/// # Errors
///
/// - `input` for values that are neither strings nor objects, strings
///   that are not a URL, JSON object or compact JWS, and bodies whose
///   generation cannot be determined.
/// - `jws-decode`, `jws-algorithm`, `jws-payload-parse` for tokens.
/// - The [`FetchError`](badge_core::FetchError) itself when a URL input
///   cannot be fetched.
pub async fn classify(fetcher: &Fetcher, raw: &Value) -> Result<ResolvedInput, BadgeError> {
    let (representation, assertion, token, source_url) = match raw {
        Value::Object(_) => (RepresentationKind::Json, raw.clone(), None, None),
        Value::String(s) => classify_string(fetcher, s.trim()).await?,
        _ => {
            return Err(ValidationError::input("input must be a string or an object").into());
        }
    };

    let generation = resolve_generation(&assertion)?;
    tracing::debug!(?representation, ?generation, "classified input");

    Ok(ResolvedInput {
        raw: raw.clone(),
        representation,
        generation,
        assertion,
        token,
        source_url,
    })
}

type Classified = (RepresentationKind, Value, Option<String>, Option<String>);

async fn classify_string(fetcher: &Fetcher, s: &str) -> Result<Classified, BadgeError> {
    if format::is_url(s) {
        let body = fetcher
            .fetch(&FetchSpec::required(INPUT_FIELD, Some(s)).as_json())
            .await?
            .into_json()
            .filter(Value::is_object)
            .ok_or_else(|| {
                ValidationError::input("URL does not point to a JSON object").with_url(s)
            })?;
        return Ok((RepresentationKind::Url, body, None, Some(s.to_string())));
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(s) {
        if parsed.is_object() {
            return Ok((RepresentationKind::Json, parsed, None, None));
        }
        return Err(ValidationError::input("JSON input must be an object").into());
    }

    if s.split('.').count() == 3 {
        let decoded = badge_crypto::decode(s).map_err(ValidationError::from)?;
        return Ok((
            RepresentationKind::SignedToken,
            decoded.payload,
            Some(s.to_string()),
            None,
        ));
    }

    Err(ValidationError::input("input is not a URL, a JSON object, or a signed token").into())
}

/// Whether `input` looks like a signed badge: a compact JWS string.
pub fn is_signed_badge(input: &Value) -> bool {
    input
        .as_str()
        .is_some_and(|s| badge_crypto::is_compact_jws(s.trim()))
}
