//! # Versioned Rule Tables
//!
//! One static table per `(SpecVersion, Role)`. Paths are dotted and
//! resolved against the object being validated. Tables are data, not
//! code: the engine in [`crate::structure`] is the same for every version.
//!
//! 2.0.0 has no tables; [`table`] returns `None` for it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use badge_core::SpecVersion;

use crate::format;

/// Which linked document a table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The assertion itself.
    Assertion,
    /// The badge class (`badge`).
    #[serde(rename = "badge")]
    BadgeClass,
    /// The issuing organization.
    Issuer,
}

impl Role {
    /// Key used for this role in aggregated `structure` errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assertion => "assertion",
            Self::BadgeClass => "badge",
            Self::Issuer => "issuer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a field must, may, or must not appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    Forbidden,
}

/// A check applied to a present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Presence only.
    Any,
    Object,
    Bool,
    /// Any string.
    Str,
    /// A string of at most N characters.
    BoundedStr(usize),
    /// Exactly this string.
    Literal(&'static str),
    /// One of these strings.
    OneOf(&'static [&'static str]),
    Email,
    Hash,
    Url,
    DataUrl,
    RelativePath,
    Origin,
    Time,
    Version,
    /// An array whose every element satisfies the inner check.
    ArrayOf(&'static Check),
    /// At least one branch matches.
    AnyOf(&'static [Check]),
}

impl Check {
    /// Evaluate the check against a present, non-null value.
    pub fn matches(&self, value: &Value) -> bool {
        let text = value.as_str();
        match self {
            Self::Any => true,
            Self::Object => value.is_object(),
            Self::Bool => value.is_boolean(),
            Self::Str => text.is_some(),
            Self::BoundedStr(max) => text.is_some_and(|s| s.chars().count() <= *max),
            Self::Literal(expected) => text == Some(*expected),
            Self::OneOf(options) => text.is_some_and(|s| options.contains(&s)),
            Self::Email => text.is_some_and(format::is_email),
            Self::Hash => text.is_some_and(format::is_hash),
            Self::Url => text.is_some_and(format::is_url),
            Self::DataUrl => text.is_some_and(format::is_data_url),
            Self::RelativePath => text.is_some_and(format::is_relative_path),
            Self::Origin => text.is_some_and(format::is_origin),
            Self::Time => format::is_time(value),
            Self::Version => text.is_some_and(format::is_version),
            Self::ArrayOf(inner) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| inner.matches(item))),
            Self::AnyOf(branches) => branches.iter().any(|b| b.matches(value)),
        }
    }

    /// What the check expects, for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any value".into(),
            Self::Object => "an object".into(),
            Self::Bool => "a boolean".into(),
            Self::Str => "a string".into(),
            Self::BoundedStr(max) => format!("a string of at most {max} characters"),
            Self::Literal(s) => format!("`{s}`"),
            Self::OneOf(options) => format!("one of {}", options.join(", ")),
            Self::Email => "an email address".into(),
            Self::Hash => "a hash of the form `algorithm$hexdigest`".into(),
            Self::Url => "an absolute URL".into(),
            Self::DataUrl => "a data URL".into(),
            Self::RelativePath => "a relative path".into(),
            Self::Origin => "an origin (scheme, host and optional port)".into(),
            Self::Time => "a Unix timestamp or ISO-8601 date".into(),
            Self::Version => "a version like `1.0` or `v1.0.0`".into(),
            Self::ArrayOf(inner) => format!("an array where every item is {}", inner.describe()),
            Self::AnyOf(branches) => branches
                .iter()
                .map(Check::describe)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

/// One row of a rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub path: &'static str,
    pub presence: Presence,
    pub check: Check,
    /// Replaces the default failure message.
    pub message: Option<&'static str>,
}

const fn req(path: &'static str, check: Check) -> Rule {
    Rule { path, presence: Presence::Required, check, message: None }
}

const fn opt(path: &'static str, check: Check) -> Rule {
    Rule { path, presence: Presence::Optional, check, message: None }
}

const fn forbid(path: &'static str) -> Rule {
    Rule { path, presence: Presence::Forbidden, check: Check::Any, message: None }
}

const fn with_message(rule: Rule, message: &'static str) -> Rule {
    Rule { message: Some(message), ..rule }
}

const EMAIL_OR_HASH: Check = Check::AnyOf(&[Check::Email, Check::Hash]);
const URL_OR_DATA: Check = Check::AnyOf(&[Check::Url, Check::DataUrl]);
const URL_OR_RELATIVE: Check = Check::AnyOf(&[Check::Url, Check::RelativePath]);
const IMAGE_0_5: Check = Check::AnyOf(&[Check::Url, Check::DataUrl, Check::RelativePath]);
const SCHEMES: Check = Check::OneOf(&["hosted", "signed"]);
const SHORT_TEXT: Check = Check::BoundedStr(128);

static ASSERTION_0_5_0: &[Rule] = &[
    with_message(
        req("recipient", EMAIL_OR_HASH),
        "recipient must be an email address or a hash of the form `algorithm$hexdigest`",
    ),
    opt("salt", Check::Str),
    opt("evidence", URL_OR_RELATIVE),
    opt("expires", Check::Time),
    opt("issued_on", Check::Time),
    req("badge", Check::Object),
    req("badge.version", Check::Version),
    req("badge.name", SHORT_TEXT),
    req("badge.description", SHORT_TEXT),
    req("badge.image", IMAGE_0_5),
    req("badge.criteria", URL_OR_RELATIVE),
    req("badge.issuer", Check::Object),
    req("badge.issuer.origin", Check::Origin),
    req("badge.issuer.name", SHORT_TEXT),
    opt("badge.issuer.org", SHORT_TEXT),
    opt("badge.issuer.contact", Check::Email),
    forbid("verify"),
    forbid("uid"),
];

static ASSERTION_1_0_0: &[Rule] = &[
    forbid("@context"),
    req("uid", Check::Str),
    req("recipient", Check::Object),
    req("recipient.type", Check::Literal("email")),
    req("recipient.identity", EMAIL_OR_HASH),
    req("recipient.hashed", Check::Bool),
    opt("recipient.salt", Check::Str),
    req("badge", Check::Url),
    req("verify", Check::Object),
    req("verify.type", SCHEMES),
    req("verify.url", Check::Url),
    req("issuedOn", Check::Time),
    opt("expires", Check::Time),
    opt("evidence", Check::Url),
    opt("image", URL_OR_DATA),
];

static BADGE_CLASS_1_0_0: &[Rule] = &[
    forbid("@context"),
    req("name", Check::Str),
    req("description", Check::Str),
    req("image", URL_OR_DATA),
    req("criteria", Check::Url),
    req("issuer", Check::Url),
    opt("alignment", Check::ArrayOf(&Check::Object)),
    opt("tags", Check::ArrayOf(&Check::Str)),
];

static ISSUER_1_0_0: &[Rule] = &[
    forbid("@context"),
    req("name", Check::Str),
    req("url", Check::Url),
    opt("description", Check::Str),
    opt("image", URL_OR_DATA),
    opt("email", Check::Email),
    opt("revocationList", Check::Url),
];

static ASSERTION_1_1_0: &[Rule] = &[
    req("@context", Check::Url),
    opt("type", Check::Str),
    opt("id", Check::Url),
    req("uid", Check::Str),
    req("recipient", Check::Object),
    req("recipient.type", Check::Literal("email")),
    req("recipient.identity", EMAIL_OR_HASH),
    req("recipient.hashed", Check::Bool),
    opt("recipient.salt", Check::Str),
    req("badge", Check::Url),
    req("verify", Check::Object),
    req("verify.type", SCHEMES),
    req("verify.url", Check::Url),
    req("issuedOn", Check::Time),
    opt("expires", Check::Time),
    opt("evidence", Check::Url),
    opt("image", URL_OR_DATA),
];

static BADGE_CLASS_1_1_0: &[Rule] = &[
    req("@context", Check::Url),
    req("name", Check::Str),
    req("description", Check::Str),
    req("image", URL_OR_DATA),
    req("criteria", Check::Url),
    req("issuer", Check::Url),
    opt("alignment", Check::ArrayOf(&Check::Object)),
    opt("tags", Check::ArrayOf(&Check::Str)),
];

static ISSUER_1_1_0: &[Rule] = &[
    req("@context", Check::Url),
    req("name", Check::Str),
    req("url", Check::Url),
    opt("description", Check::Str),
    opt("image", URL_OR_DATA),
    opt("email", Check::Email),
    opt("revocationList", Check::Url),
];

/// The rule table for a version and role.
///
/// 0.5.0 embeds the badge class and issuer inside the assertion, so its
/// assertion table covers all three; its `BadgeClass` and `Issuer` tables
/// are empty.
pub fn table(version: SpecVersion, role: Role) -> Option<&'static [Rule]> {
    match (version, role) {
        (SpecVersion::V0_5_0, Role::Assertion) => Some(ASSERTION_0_5_0),
        (SpecVersion::V0_5_0, Role::BadgeClass | Role::Issuer) => Some(&[]),
        (SpecVersion::V1_0_0, Role::Assertion) => Some(ASSERTION_1_0_0),
        (SpecVersion::V1_0_0, Role::BadgeClass) => Some(BADGE_CLASS_1_0_0),
        (SpecVersion::V1_0_0, Role::Issuer) => Some(ISSUER_1_0_0),
        (SpecVersion::V1_1_0, Role::Assertion) => Some(ASSERTION_1_1_0),
        (SpecVersion::V1_1_0, Role::BadgeClass) => Some(BADGE_CLASS_1_1_0),
        (SpecVersion::V1_1_0, Role::Issuer) => Some(ISSUER_1_1_0),
        (SpecVersion::V2_0_0, _) => None,
    }
}
