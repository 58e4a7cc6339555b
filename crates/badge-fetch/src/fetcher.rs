//! HTTP and `data:` resolution.

use std::collections::BTreeMap;

use futures::future::join_all;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use serde_json::Value;
use url::Url;

use badge_core::{ErrorCode, FetchError};

use crate::config::{ConfigError, FetchConfig};
use crate::data_uri;
use crate::resource::Resource;

const JSON_ACCEPT: &str = "application/ld+json, application/json;q=0.9, */*;q=0.1";

/// Outcome of [`Fetcher::fetch_all`]: the failures (or `None` when every
/// fetch succeeded) and the successes, both keyed like the input map.
pub type BatchResult = (Option<BTreeMap<String, FetchError>>, BTreeMap<String, Resource>);

/// One resource to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    /// Dotted field path the URL came from. Reported in every error.
    pub field: String,
    /// URL to fetch. `None` means the field was absent.
    pub url: Option<String>,
    /// Whether an absent URL is an error.
    pub required: bool,
    /// Expected MIME type, compared by essence and case-insensitively.
    pub content_type: Option<String>,
    /// Parse the body as JSON.
    pub json: bool,
}

impl FetchSpec {
    /// A resource whose absence is a `required` error.
    pub fn required(field: impl Into<String>, url: Option<impl Into<String>>) -> Self {
        Self {
            field: field.into(),
            url: url.map(Into::into),
            required: true,
            content_type: None,
            json: false,
        }
    }

    /// A resource that may be absent.
    pub fn optional(field: impl Into<String>, url: Option<impl Into<String>>) -> Self {
        Self {
            required: false,
            ..Self::required(field, url)
        }
    }

    /// Require the response to declare this MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Parse the body as JSON.
    pub fn as_json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Resolves [`FetchSpec`]s over HTTP(S) or locally for `data:` URIs.
///
/// Holds only an immutable connection pool, so one instance can be shared
/// across tasks.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
}

impl Fetcher {
    /// Build a fetcher from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { http })
    }

    /// Wrap an existing client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Resolve one resource.
    ///
    /// # Errors
    ///
    /// - `required`: URL absent and the spec is required.
    /// - `unreachable`: invalid URL, unsupported scheme, or transport failure.
    /// - `http-status`: non-2xx after redirects.
    /// - `content-type`: declared type differs from the expected one.
    /// - `parse`: JSON requested but the body does not parse.
    pub async fn fetch(&self, spec: &FetchSpec) -> Result<Resource, FetchError> {
        let Some(url) = spec.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            if spec.required {
                return Err(FetchError::new(ErrorCode::Required, &spec.field));
            }
            return Ok(Resource::Absent);
        };

        if data_uri::is_data_uri(url) {
            let data = data_uri::parse(url).map_err(|reason| {
                FetchError::new(ErrorCode::Parse, &spec.field)
                    .with_url(url)
                    .with_reason(reason)
            })?;
            return finish(spec, url, Some(data.media_type), data.bytes);
        }

        let unreachable = |reason: String| {
            FetchError::new(ErrorCode::Unreachable, &spec.field)
                .with_url(url)
                .with_reason(reason)
        };

        let parsed = Url::parse(url).map_err(|e| unreachable(format!("invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(unreachable(format!("unsupported URL scheme `{}`", parsed.scheme())));
        }

        tracing::debug!(field = %spec.field, %url, "fetching resource");

        let mut request = self.http.get(parsed);
        if spec.json {
            request = request.header(ACCEPT, JSON_ACCEPT);
        }
        let resp = request.send().await.map_err(|e| unreachable(describe(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(field = %spec.field, %url, status = status.as_u16(), "non-success status");
            return Err(FetchError::new(ErrorCode::HttpStatus, &spec.field)
                .with_url(url)
                .with_mismatch("200", status.as_u16().to_string()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(|e| unreachable(describe(&e)))?;

        finish(spec, url, content_type, bytes.to_vec())
    }

    /// Resolve a batch concurrently.
    ///
    /// Every fetch runs to completion. Each spec's `field` is replaced by
    /// its key so errors name the key they were requested under.
    pub async fn fetch_all(&self, specs: BTreeMap<String, FetchSpec>) -> BatchResult {
        let jobs = specs.into_iter().map(|(key, mut spec)| async move {
            spec.field = key.clone();
            let outcome = self.fetch(&spec).await;
            (key, outcome)
        });

        let mut errors = BTreeMap::new();
        let mut resources = BTreeMap::new();
        for (key, outcome) in join_all(jobs).await {
            match outcome {
                Ok(resource) => {
                    resources.insert(key, resource);
                }
                Err(err) => {
                    errors.insert(key, err);
                }
            }
        }

        if !errors.is_empty() {
            tracing::debug!(failed = errors.len(), succeeded = resources.len(), "batch fetch finished with failures");
        }
        ((!errors.is_empty()).then_some(errors), resources)
    }
}

fn finish(
    spec: &FetchSpec,
    url: &str,
    content_type: Option<String>,
    bytes: Vec<u8>,
) -> Result<Resource, FetchError> {
    if let Some(expected) = spec.content_type.as_deref() {
        let received = content_type.as_deref().map(essence).unwrap_or_default();
        if received != essence(expected) {
            return Err(FetchError::new(ErrorCode::ContentType, &spec.field)
                .with_url(url)
                .with_mismatch(expected, content_type.as_deref().unwrap_or("none")));
        }
    }

    if spec.json {
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            FetchError::new(ErrorCode::Parse, &spec.field)
                .with_url(url)
                .with_reason(e.to_string())
        })?;
        return Ok(Resource::Json(value));
    }

    Ok(Resource::Body { content_type, bytes })
}

/// `type/subtype` without parameters, lowercased.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_redirect() {
        format!("too many redirects: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
