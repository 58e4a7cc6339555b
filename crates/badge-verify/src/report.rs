//! The success payload of a validation run.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use badge_core::{AssertionGuid, SchemeKind, SpecVersion};
use badge_fetch::Resource;

use crate::linked::LinkedStructures;

/// Everything learned while validating an assertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub version: SpecVersion,
    pub scheme: SchemeKind,
    /// Absent for legacy objects, which carry no canonical URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<AssertionGuid>,
    /// The assertion body, with legacy relative URLs resolved.
    pub assertion: Value,
    pub structures: LinkedStructures,
    pub resources: BTreeMap<String, Resource>,
    /// Evaluated extensions; every key maps to `true`.
    pub extensions: BTreeMap<String, bool>,
    /// The compact JWS, for signed assertions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ValidationReport {
    pub fn is_signed(&self) -> bool {
        self.scheme == SchemeKind::Signed
    }
}
