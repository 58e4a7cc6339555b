//! # Verification Orchestrator
//!
//! Runs the full pipeline over one input:
//!
//! ```text
//! classify -> resolve scheme -> validate structure -> fetch resources
//!          -> [verify signature] -> [check revocation] -> validate extensions
//! ```
//!
//! Every stage short-circuits on failure with a single error. Stages that
//! fan out (linked structures, resources, extensions) aggregate their
//! sub-failures into that error's `extra` map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use badge_core::{
    AssertionGuid, BadgeError, ErrorCode, RepresentationKind, SchemeKind, SpecVersion, ValidationError,
};
use badge_fetch::{ConfigError, FetchConfig, FetchSpec, Fetcher, Resource};
use badge_schema::{format, lookup, structure, Role};

use crate::absolutize::absolutize;
use crate::classify::{self, type_mismatch, ResolvedInput};
use crate::context::{ContextExpander, JsonLdExpander};
use crate::extension::{self, ExtensionMap};
use crate::linked::{self, LinkedStructures};
use crate::report::ValidationReport;
use crate::revocation::check_revoked;
use crate::signature::{origin_of, signature_error, verify_signature};

/// Settings for a [`Validator`].
#[derive(Clone)]
pub struct ValidatorConfig {
    pub fetch: FetchConfig,
    /// Linked-data collaborator for extension contexts.
    pub expander: Arc<dyn ContextExpander>,
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("fetch", &self.fetch)
            .field("expander", &"dyn ContextExpander")
            .finish()
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            expander: Arc::new(JsonLdExpander::default()),
        }
    }
}

impl ValidatorConfig {
    /// Fetch settings from the environment, JSON-LD expander.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            fetch: FetchConfig::from_env()?,
            ..Self::default()
        })
    }
}

/// Validates badge assertions.
///
/// Holds an HTTP connection pool and the context expander, nothing else.
/// Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct Validator {
    fetcher: Fetcher,
    expander: Arc<dyn ContextExpander>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("fetcher", &self.fetcher).finish_non_exhaustive()
    }
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            fetcher: Fetcher::new(&config.fetch)?,
            expander: config.expander,
        })
    }

    /// Build from an existing fetcher and expander.
    pub fn from_parts(fetcher: Fetcher, expander: Arc<dyn ContextExpander>) -> Self {
        Self { fetcher, expander }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Classify an input without validating it.
    pub async fn classify(&self, raw: &Value) -> Result<ResolvedInput, BadgeError> {
        classify::classify(&self.fetcher, raw).await
    }

    /// Validate any supported input: an assertion object, a JSON string,
    /// a hosted assertion URL, or a compact JWS.
    ///
    /// `expected_version` and `expected_scheme` pin what the caller will
    /// accept; a mismatch fails before any further network access.
    pub async fn validate(
        &self,
        input: &Value,
        expected_version: Option<SpecVersion>,
        expected_scheme: Option<SchemeKind>,
    ) -> Result<ValidationReport, BadgeError> {
        let resolved = self.classify(input).await?;
        resolved.expect(expected_version, expected_scheme)?;

        let outcome = match resolved.representation() {
            RepresentationKind::SignedToken => self.run_signed(&resolved).await,
            RepresentationKind::Json | RepresentationKind::Url => self.run_hosted(&resolved).await,
        };
        log_verdict(&resolved, &outcome);
        outcome
    }

    /// Validate a hosted assertion given as an object or as its URL.
    ///
    /// A caller-supplied 1.x object is re-fetched from `verify.url` and must
    /// equal the hosted copy exactly.
    pub async fn validate_hosted(&self, input: &Value) -> Result<ValidationReport, BadgeError> {
        let resolved = self.classify(input).await?;
        if resolved.representation() == RepresentationKind::SignedToken {
            return Err(type_mismatch(SchemeKind::Hosted, SchemeKind::Signed).into());
        }
        let outcome = self.run_hosted(&resolved).await;
        log_verdict(&resolved, &outcome);
        outcome
    }

    /// Validate a signed assertion given as a compact JWS.
    pub async fn validate_signed(&self, token: &str) -> Result<ValidationReport, BadgeError> {
        let resolved = self.classify(&Value::String(token.to_string())).await?;
        if resolved.representation() != RepresentationKind::SignedToken {
            return Err(ValidationError::new(ErrorCode::JwsDecode, "input is not a compact JWS").into());
        }
        let outcome = self.run_signed(&resolved).await;
        log_verdict(&resolved, &outcome);
        outcome
    }

    /// Resolve the badge class and issuer of an assertion.
    pub async fn get_linked_structures(
        &self,
        assertion: &Value,
        version: SpecVersion,
    ) -> Result<LinkedStructures, BadgeError> {
        linked::get_linked_structures(&self.fetcher, assertion, version).await
    }

    /// Fetch the images, criteria, evidence and issuer URL of an assertion.
    pub async fn get_linked_resources(
        &self,
        assertion: &Value,
        version: SpecVersion,
        structures: &LinkedStructures,
    ) -> Result<BTreeMap<String, Resource>, BadgeError> {
        linked::get_linked_resources(&self.fetcher, assertion, version, structures).await
    }

    /// Validate the extensions embedded in an assertion.
    pub async fn validate_extensions(&self, assertion: &Value) -> (Option<ValidationError>, ExtensionMap) {
        extension::validate_extensions(&self.fetcher, self.expander.as_ref(), assertion).await
    }

    async fn run_hosted(&self, resolved: &ResolvedInput) -> Result<ValidationReport, BadgeError> {
        let version = supported(resolved)?;
        if resolved.scheme() != SchemeKind::Hosted {
            return Err(type_mismatch(SchemeKind::Hosted, resolved.scheme()).into());
        }
        let assertion = resolved.assertion();

        let canonical_url = match resolved.source_url() {
            Some(url) => Some(url.to_string()),
            None if version.is_v1() => lookup(assertion, "verify.url")
                .and_then(Value::as_str)
                .filter(|u| format::is_url(u))
                .map(str::to_string),
            None => None,
        };
        if resolved.representation() == RepresentationKind::Json {
            if let Some(url) = canonical_url.as_deref() {
                self.compare_hosted(assertion, url).await?;
            }
        }

        let structures = self.validate_structures(assertion, version).await?;
        let resources = self.get_linked_resources(assertion, version, &structures).await?;
        let extensions = self.checked_extensions(assertion).await?;

        Ok(ValidationReport {
            version,
            scheme: SchemeKind::Hosted,
            guid: canonical_url.as_deref().map(AssertionGuid::hosted),
            assertion: absolutize(assertion),
            structures,
            resources,
            extensions,
            token: None,
        })
    }

    async fn run_signed(&self, resolved: &ResolvedInput) -> Result<ValidationReport, BadgeError> {
        let version = supported(resolved)?;
        if resolved.scheme() != SchemeKind::Signed {
            return Err(type_mismatch(SchemeKind::Signed, resolved.scheme()).into());
        }
        let token = resolved
            .token()
            .ok_or_else(|| ValidationError::input("signed assertions must be supplied as a compact JWS"))?;
        let assertion = resolved.assertion();

        let structures = self.validate_structures(assertion, version).await?;
        let resources = self.get_linked_resources(assertion, version, &structures).await?;

        let key_url = lookup(assertion, "verify.url").and_then(Value::as_str);
        let key = self
            .fetcher
            .fetch(&FetchSpec::required("verify.url", key_url))
            .await?;
        let pem = key.text().map(|t| t.into_owned()).unwrap_or_default();
        let key_url = key_url.unwrap_or_default();
        if !verify_signature(token, &pem) {
            tracing::warn!(%key_url, "signature did not verify");
            return Err(signature_error(key_url).into());
        }

        if let Some(list_url) = lookup(&structures.issuer, "revocationList").and_then(Value::as_str) {
            let list = self
                .fetcher
                .fetch(&FetchSpec::required("issuer.revocationList", Some(list_url)).as_json())
                .await?
                .into_json()
                .unwrap_or(Value::Null);
            if let Some(err) = check_revoked(&list, assertion) {
                return Err(err.with_url(list_url).into());
            }
        }

        let extensions = self.checked_extensions(assertion).await?;

        let guid = lookup(assertion, "uid")
            .and_then(Value::as_str)
            .zip(origin_of(key_url))
            .map(|(uid, origin)| AssertionGuid::signed(uid, &origin));

        Ok(ValidationReport {
            version,
            scheme: SchemeKind::Signed,
            guid,
            assertion: assertion.clone(),
            structures,
            resources,
            extensions,
            token: Some(token.to_string()),
        })
    }

    async fn compare_hosted(&self, assertion: &Value, url: &str) -> Result<(), BadgeError> {
        let hosted = self
            .fetcher
            .fetch(&FetchSpec::required("verify.url", Some(url)).as_json())
            .await?
            .into_json()
            .unwrap_or(Value::Null);
        if hosted != *assertion {
            return Err(ValidationError::new(
                ErrorCode::DeepEqual,
                "supplied assertion differs from the hosted copy",
            )
            .with_field("verify.url")
            .with_url(url)
            .into());
        }
        Ok(())
    }

    async fn validate_structures(
        &self,
        assertion: &Value,
        version: SpecVersion,
    ) -> Result<LinkedStructures, BadgeError> {
        let own = structure::validate(assertion, version, Role::Assertion)?;
        if let Some(err) = structure::into_error(Role::Assertion, own) {
            return Err(structure_failure(BTreeMap::from([(
                Role::Assertion.as_str().to_string(),
                err.into(),
            )])));
        }

        match linked::check_linked_structures(&self.fetcher, assertion, version).await {
            (Some(structures), findings) if findings.is_empty() => Ok(structures),
            (_, findings) => Err(structure_failure(findings)),
        }
    }

    /// The evaluated map survives a failure as `partial["extensions"]`.
    async fn checked_extensions(&self, assertion: &Value) -> Result<ExtensionMap, BadgeError> {
        match self.validate_extensions(assertion).await {
            (None, map) => Ok(map),
            (Some(err), map) => Err(err.with_partial("extensions", &map).into()),
        }
    }
}

fn supported(resolved: &ResolvedInput) -> Result<SpecVersion, BadgeError> {
    let version = resolved.version();
    if version.is_supported() {
        Ok(version)
    } else {
        Err(structure::unsupported(version).into())
    }
}

fn structure_failure(extra: BTreeMap<String, BadgeError>) -> BadgeError {
    ValidationError::new(ErrorCode::Structure, "could not validate assertion structure")
        .with_extra(extra)
        .into()
}

fn log_verdict(resolved: &ResolvedInput, outcome: &Result<ValidationReport, BadgeError>) {
    let version = resolved.version();
    let scheme = resolved.scheme();
    match outcome {
        Ok(report) => tracing::info!(%version, %scheme, guid = ?report.guid, "assertion valid"),
        Err(err) => tracing::info!(%version, %scheme, code = %err.code(), "assertion invalid"),
    }
}
