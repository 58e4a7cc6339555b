//! # Linked Structures and Resources
//!
//! A 1.x assertion links its badge class by URL, and the badge class links
//! its issuer. A 0.5.0 assertion embeds both. Either way the validator
//! needs all three documents, plus the images, criteria and evidence they
//! reference.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use badge_core::{BadgeError, ErrorCode, SpecVersion, ValidationError};
use badge_fetch::{FetchSpec, Fetcher, Resource};
use badge_schema::{lookup, structure, Role};

use crate::absolutize::absolutize;

const PNG: &str = "image/png";

/// The badge class and issuer of one assertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedStructures {
    pub badge: Value,
    pub issuer: Value,
}

fn url_at<'a>(doc: &'a Value, path: &str) -> Option<&'a str> {
    lookup(doc, path).and_then(Value::as_str)
}

/// Fetch a linked document and require a JSON object.
///
/// # Errors
///
/// The fetch error itself, or `structure` if the body is not an object.
pub async fn fetch_structure(
    fetcher: &Fetcher,
    field: &str,
    url: Option<&str>,
) -> Result<Value, BadgeError> {
    let doc = fetcher
        .fetch(&FetchSpec::required(field, url).as_json())
        .await?
        .into_json()
        .unwrap_or(Value::Null);
    if !doc.is_object() {
        let mut err = ValidationError::new(ErrorCode::Structure, format!("`{field}` must link to a JSON object"))
            .with_field(field);
        if let Some(url) = url {
            err = err.with_url(url);
        }
        return Err(err.into());
    }
    Ok(doc)
}

/// Resolve the badge class and issuer of an assertion.
///
/// For 1.x, the badge class is fetched from `badge` and the issuer from
/// the badge class's `issuer`. For 0.5.0 both are read from the assertion.
///
/// # Errors
///
/// - `unsupported-version` for 2.0.0.
/// - `required` when a 0.5.0 assertion lacks an embedded document.
/// - Fetch errors, or `structure` for non-object documents.
pub async fn get_linked_structures(
    fetcher: &Fetcher,
    assertion: &Value,
    version: SpecVersion,
) -> Result<LinkedStructures, BadgeError> {
    match version {
        SpecVersion::V0_5_0 => {
            let embedded = |path: &str| {
                lookup(assertion, path)
                    .filter(|v| v.is_object())
                    .cloned()
                    .ok_or_else(|| {
                        BadgeError::from(
                            ValidationError::new(ErrorCode::Required, format!("missing embedded `{path}`"))
                                .with_field(path),
                        )
                    })
            };
            Ok(LinkedStructures {
                badge: embedded("badge")?,
                issuer: embedded("badge.issuer")?,
            })
        }
        SpecVersion::V1_0_0 | SpecVersion::V1_1_0 => {
            let badge = fetch_structure(fetcher, "badge", url_at(assertion, "badge")).await?;
            let issuer = fetch_structure(fetcher, "issuer", url_at(&badge, "issuer")).await?;
            Ok(LinkedStructures { badge, issuer })
        }
        SpecVersion::V2_0_0 => Err(structure::unsupported(version).into()),
    }
}

/// Fetch specs for the linked resources of an assertion.
pub fn resource_specs(
    assertion: &Value,
    version: SpecVersion,
    structures: &LinkedStructures,
) -> BTreeMap<String, FetchSpec> {
    let mut specs = BTreeMap::new();
    let mut add = |key: &str, spec: FetchSpec| {
        specs.insert(key.to_string(), spec);
    };

    match version {
        SpecVersion::V0_5_0 => {
            let absolute = absolutize(assertion);
            add(
                "badge.image",
                FetchSpec::required("badge.image", url_at(&absolute, "badge.image")).with_content_type(PNG),
            );
            add(
                "badge.criteria",
                FetchSpec::required("badge.criteria", url_at(&absolute, "badge.criteria")),
            );
            add("evidence", FetchSpec::optional("evidence", url_at(&absolute, "evidence")));
        }
        SpecVersion::V1_0_0 | SpecVersion::V1_1_0 => {
            let badge = &structures.badge;
            let issuer = &structures.issuer;
            add(
                "assertion.image",
                FetchSpec::optional("assertion.image", url_at(assertion, "image")).with_content_type(PNG),
            );
            add(
                "assertion.evidence",
                FetchSpec::optional("assertion.evidence", url_at(assertion, "evidence")),
            );
            add(
                "badge.image",
                FetchSpec::required("badge.image", url_at(badge, "image")).with_content_type(PNG),
            );
            add("badge.criteria", FetchSpec::required("badge.criteria", url_at(badge, "criteria")));
            add("issuer.url", FetchSpec::required("issuer.url", url_at(issuer, "url")));
            add(
                "issuer.image",
                FetchSpec::optional("issuer.image", url_at(issuer, "image")).with_content_type(PNG),
            );
        }
        SpecVersion::V2_0_0 => {}
    }
    specs
}

/// Fetch every linked resource concurrently.
///
/// # Errors
///
/// One `resources` error whose `extra` holds each failed fetch by key and
/// whose `partial["resources"]` holds the fetches that succeeded.
pub async fn get_linked_resources(
    fetcher: &Fetcher,
    assertion: &Value,
    version: SpecVersion,
    structures: &LinkedStructures,
) -> Result<BTreeMap<String, Resource>, BadgeError> {
    if !version.is_supported() {
        return Err(structure::unsupported(version).into());
    }
    let (errors, resources) = fetcher
        .fetch_all(resource_specs(assertion, version, structures))
        .await;
    match errors {
        None => Ok(resources),
        Some(errors) => {
            let extra = errors.into_iter().map(|(k, e)| (k, e.into())).collect();
            Err(ValidationError::new(ErrorCode::Resources, "could not fetch linked resources")
                .with_extra(extra)
                .with_partial("resources", &resources)
                .into())
        }
    }
}

/// Validate the badge class and issuer, fetching them for 1.x.
///
/// The assertion must already have passed its own table. Findings are
/// keyed `badge` and `issuer`; a document that cannot be fetched is
/// reported under its key as the fetch error.
pub(crate) async fn check_linked_structures(
    fetcher: &Fetcher,
    assertion: &Value,
    version: SpecVersion,
) -> (Option<LinkedStructures>, BTreeMap<String, BadgeError>) {
    let mut findings = BTreeMap::new();

    if version == SpecVersion::V0_5_0 {
        return match get_linked_structures(fetcher, assertion, version).await {
            Ok(s) => (Some(s), findings),
            Err(e) => {
                findings.insert(Role::Assertion.as_str().to_string(), e);
                (None, findings)
            }
        };
    }

    let badge = match fetch_structure(fetcher, "badge", url_at(assertion, "badge")).await {
        Ok(badge) => badge,
        Err(e) => {
            findings.insert(Role::BadgeClass.as_str().to_string(), e);
            return (None, findings);
        }
    };
    record(&mut findings, &badge, version, Role::BadgeClass);

    let issuer = match fetch_structure(fetcher, "issuer", url_at(&badge, "issuer")).await {
        Ok(issuer) => issuer,
        Err(e) => {
            findings.insert(Role::Issuer.as_str().to_string(), e);
            return (None, findings);
        }
    };
    record(&mut findings, &issuer, version, Role::Issuer);

    (Some(LinkedStructures { badge, issuer }), findings)
}

fn record(findings: &mut BTreeMap<String, BadgeError>, doc: &Value, version: SpecVersion, role: Role) {
    let outcome = structure::validate(doc, version, role).map(|errors| structure::into_error(role, errors));
    match outcome {
        Ok(None) => {}
        Ok(Some(err)) | Err(err) => {
            findings.insert(role.as_str().to_string(), err.into());
        }
    }
}
