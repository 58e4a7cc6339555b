//! # Extension Contexts
//!
//! An extension points at a JSON-LD context document. Besides term
//! definitions, that document lists validation entries: which extension
//! type it describes and where that type's JSON Schema lives.
//!
//! ```json
//! {
//!   "@context": "https://w3id.org/openbadges/v1",
//!   "validation": [{
//!     "validatesType": "extensions:ApplyLink",
//!     "validationSchema": "https://example.org/apply-link/schema.json"
//!   }]
//! }
//! ```
//!
//! [`JsonLdExpander`] runs the document through a JSON-LD 1.1 processor.
//! Every context it imports, directly or through scoped contexts, is
//! fetched with the validator's [`Fetcher`] first; expansion then runs
//! against that set and never touches the network itself.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::executor::block_on;
use iref::{Iri, IriBuf};
use json_ld::{JsonLdProcessor, LoadError, Loader, RemoteDocument};
use serde::Serialize;
use serde_json::{json, Value};
use static_iref::iri;
use thiserror::Error;
use url::Url;

use badge_fetch::{FetchSpec, Fetcher};

/// Upper bound on context documents loaded for one extension.
pub const DEFAULT_MAX_CONTEXTS: usize = 16;

/// One validation entry of an extension context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDescriptor {
    /// URL of the context document the entry came from.
    pub context_url: String,
    /// Expanded IRI of the extension type.
    pub validated_type: String,
    /// URL of the JSON Schema for that type.
    pub schema_url: String,
}

/// What an extension context says about one extension instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedContext {
    /// Validation entries declared by the context.
    pub descriptors: Vec<ExtensionDescriptor>,
    /// The instance's `type` values as absolute IRIs, in input order.
    pub expanded_types: Vec<String>,
}

impl ResolvedContext {
    /// Entries whose validated type is one of the instance's types.
    pub fn matching(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| self.expanded_types.contains(&d.validated_type))
    }
}

/// Linked-data collaborator used by the extension engine.
#[async_trait]
pub trait ContextExpander: Send + Sync {
    /// Read the validation entries of the context document fetched from
    /// `context_url` and expand `types` under that same context.
    ///
    /// Returns a message describing why the document is unusable when it
    /// cannot be processed or declares no entries.
    async fn resolve(
        &self,
        fetcher: &Fetcher,
        context_url: &str,
        document: &Value,
        types: &[&str],
    ) -> Result<ResolvedContext, String>;
}

/// [`ContextExpander`] backed by the `json-ld` processor.
#[derive(Debug, Clone, Copy)]
pub struct JsonLdExpander {
    max_contexts: usize,
}

impl Default for JsonLdExpander {
    fn default() -> Self {
        Self { max_contexts: DEFAULT_MAX_CONTEXTS }
    }
}

impl JsonLdExpander {
    pub fn with_max_contexts(max_contexts: usize) -> Self {
        Self { max_contexts }
    }

    /// Fetch `document` and everything it imports into a loader.
    async fn prefetch(&self, fetcher: &Fetcher, context_url: &str, document: &Value) -> Result<ContextSet, String> {
        let mut set = ContextSet::default();
        let mut pending = vec![(context_url.to_string(), document.clone())];

        while let Some((url, doc)) = pending.pop() {
            let imports = context_imports(&url, &doc);
            set.insert(&url, &doc)?;
            for import in imports {
                if set.contains(&import) || pending.iter().any(|(u, _)| *u == import) {
                    continue;
                }
                if set.len() + pending.len() >= self.max_contexts {
                    return Err(format!(
                        "context {context_url} imports more than {} documents",
                        self.max_contexts
                    ));
                }
                tracing::debug!(%context_url, %import, "loading imported context");
                let fetched = fetcher
                    .fetch(&FetchSpec::required("@context", Some(import.as_str())).as_json())
                    .await
                    .map_err(|e| format!("could not load imported context {import}: {}", e.message()))?;
                let value = fetched
                    .into_json()
                    .ok_or_else(|| format!("imported context {import} is not JSON"))?;
                pending.push((import, value));
            }
        }
        Ok(set)
    }
}

#[async_trait]
impl ContextExpander for JsonLdExpander {
    async fn resolve(
        &self,
        fetcher: &Fetcher,
        context_url: &str,
        document: &Value,
        types: &[&str],
    ) -> Result<ResolvedContext, String> {
        if !document.is_object() {
            return Err(format!("context {context_url} is not a JSON object"));
        }
        let contexts = self.prefetch(fetcher, context_url, document).await?;

        let root = contexts.expand(context_url, document)?;
        let validation = property(iri!("https://w3id.org/openbadges#validation"));
        let mut descriptors = Vec::new();
        for entry in root
            .iter()
            .flat_map(|node| node.get(&validation).filter_map(|object| object.as_node()))
        {
            let validated = iris_or_literals(entry, iri!("https://w3id.org/openbadges#validatesType"));
            let schemas = iris_or_literals(entry, iri!("https://w3id.org/openbadges#validationSchema"));
            let (Some(validated), Some(schema_url)) = (validated.first(), schemas.first()) else {
                continue;
            };
            let Some(validated_type) = contexts.expand_types(context_url, &[validated.as_str()])?.pop() else {
                continue;
            };
            descriptors.push(ExtensionDescriptor {
                context_url: context_url.to_string(),
                validated_type,
                schema_url: schema_url.clone(),
            });
        }
        if descriptors.is_empty() {
            return Err(format!("context {context_url} declares no validation entries"));
        }

        Ok(ResolvedContext {
            descriptors,
            expanded_types: contexts.expand_types(context_url, types)?,
        })
    }
}

#[derive(Debug, Error)]
#[error("context was not loaded before expansion")]
struct NotLoaded;

/// Context documents keyed by absolute URL, served to the processor.
#[derive(Debug, Default)]
struct ContextSet {
    documents: BTreeMap<String, json_syntax::Value>,
}

impl ContextSet {
    fn insert(&mut self, url: &str, document: &Value) -> Result<(), String> {
        let value = json_syntax::to_value(document).map_err(|e| format!("context {url} is not usable JSON: {e}"))?;
        self.documents.insert(url.to_string(), value);
        Ok(())
    }

    fn contains(&self, url: &str) -> bool {
        self.documents.contains_key(url)
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    /// Expand `document` as if it had been loaded from `base`.
    fn expand(&self, base: &str, document: &Value) -> Result<Option<json_ld::Node>, String> {
        let base_iri = IriBuf::new(base.to_string()).map_err(|_| format!("{base} is not an IRI"))?;
        let body = json_syntax::to_value(document).map_err(|e| format!("{base}: {e}"))?;
        let input = RemoteDocument::new(Some(base_iri), None, body);
        let expanded = block_on(input.expand(self)).map_err(|e| format!("could not expand {base}: {e}"))?;
        Ok(expanded.into_main_node())
    }

    /// Expand type names and compact IRIs under the context at `context_url`.
    fn expand_types(&self, context_url: &str, types: &[&str]) -> Result<Vec<String>, String> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let typed = json!({"@context": context_url, "@type": types});
        let node = self.expand(context_url, &typed)?;
        Ok(node
            .map(|n| {
                n.types()
                    .iter()
                    .filter_map(|t| t.as_iri())
                    .map(|i| i.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl Loader for ContextSet {
    async fn load(&self, url: &Iri) -> json_ld::LoadingResult {
        match self.documents.get(url.as_str()) {
            Some(document) => Ok(RemoteDocument::new(Some(url.to_owned()), None, document.clone())),
            None => Err(LoadError::new(url.to_owned(), NotLoaded)),
        }
    }
}

fn property(iri: &Iri) -> json_ld::Id {
    json_ld::Id::iri(iri.to_owned())
}

/// Node references and string literals under `prop`.
fn iris_or_literals(node: &json_ld::Node, prop: &Iri) -> Vec<String> {
    let prop = property(prop);
    node.get(&prop)
        .filter_map(|object| match object.id() {
            Some(id) => id.as_iri().map(|i| i.as_str().to_string()),
            None => object.as_str().map(str::to_string),
        })
        .collect()
}

/// Absolute URLs of every remote context referenced anywhere in `document`,
/// scoped contexts included.
fn context_imports(base: &str, document: &Value) -> Vec<String> {
    fn refs(base: &str, value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => {
                if let Some(url) = resolve_ref(base, s) {
                    if !out.contains(&url) {
                        out.push(url);
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|v| refs(base, v, out)),
            Value::Object(_) => walk(base, value, out),
            _ => {}
        }
    }
    fn walk(base: &str, value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Object(obj) => {
                for (key, v) in obj {
                    if key == "@context" {
                        refs(base, v, out);
                    } else {
                        walk(base, v, out);
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|v| walk(base, v, out)),
            _ => {}
        }
    }

    let mut out = Vec::new();
    walk(base, document, &mut out);
    out
}

fn resolve_ref(base: &str, reference: &str) -> Option<String> {
    if Url::parse(reference).is_ok() {
        return Some(reference.to_string());
    }
    Url::parse(base).ok()?.join(reference).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use badge_fetch::FetchConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OB_EXTENSIONS: &str = "https://w3id.org/openbadges/extensions#";

    fn fetcher() -> Fetcher {
        Fetcher::new(&FetchConfig::local_mock()).unwrap()
    }

    async fn serve(server: &MockServer, p: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn inline_context() -> Value {
        json!({
            "@context": {
                "obi": "https://w3id.org/openbadges#",
                "extensions": OB_EXTENSIONS,
                "validation": "obi:validation",
                "url": {"@id": "extensions:url", "@type": "@id"}
            },
            "validation": [{
                "obi:validatesType": "extensions:ApplyLink",
                "obi:validationSchema": "https://example.org/apply-link/schema.json"
            }]
        })
    }

    fn ob_terms() -> Value {
        json!({
            "@context": {
                "obi": "https://w3id.org/openbadges#",
                "extensions": OB_EXTENSIONS,
                "validation": "obi:validation",
                "validatesType": "obi:validatesType",
                "validationSchema": {"@id": "obi:validationSchema", "@type": "@id"}
            }
        })
    }

    #[tokio::test]
    async fn reads_entries_and_expands_types() {
        let ctx = "https://example.org/apply-link/context.json";
        let got = JsonLdExpander::default()
            .resolve(&fetcher(), ctx, &inline_context(), &["extensions:ApplyLink"])
            .await
            .unwrap();

        assert_eq!(
            got.descriptors,
            vec![ExtensionDescriptor {
                context_url: ctx.into(),
                validated_type: format!("{OB_EXTENSIONS}ApplyLink"),
                schema_url: "https://example.org/apply-link/schema.json".into(),
            }]
        );
        assert_eq!(got.expanded_types, vec![format!("{OB_EXTENSIONS}ApplyLink")]);
        assert_eq!(got.matching().count(), 1);
    }

    #[tokio::test]
    async fn terms_can_come_from_an_imported_context() {
        let server = MockServer::start().await;
        let base = server.uri();
        serve(&server, "/openbadges/v1", ob_terms()).await;
        let ctx = format!("{base}/apply-link/context.json");
        let doc = json!({
            "@context": format!("{base}/openbadges/v1"),
            "validation": [{
                "validatesType": "extensions:ApplyLink",
                "validationSchema": format!("{base}/apply-link/schema.json")
            }]
        });

        let got = JsonLdExpander::default()
            .resolve(&fetcher(), &ctx, &doc, &["Extension", "extensions:ApplyLink"])
            .await
            .unwrap();

        assert_eq!(got.descriptors.len(), 1);
        assert_eq!(got.descriptors[0].validated_type, format!("{OB_EXTENSIONS}ApplyLink"));
        assert_eq!(got.descriptors[0].schema_url, format!("{base}/apply-link/schema.json"));
        assert_eq!(got.matching().count(), 1);
    }

    #[tokio::test]
    async fn relative_imports_resolve_against_the_context_url() {
        let server = MockServer::start().await;
        let base = server.uri();
        serve(&server, "/shared/terms.json", ob_terms()).await;
        let doc = json!({
            "@context": ["../shared/terms.json", {"ex": "https://example.org/ns#"}],
            "validation": {
                "validatesType": "ex:Thing",
                "validationSchema": "https://example.org/thing.json"
            }
        });

        let got = JsonLdExpander::default()
            .resolve(&fetcher(), &format!("{base}/apply-link/context.json"), &doc, &["ex:Thing"])
            .await
            .unwrap();

        assert_eq!(got.descriptors[0].validated_type, "https://example.org/ns#Thing");
        assert_eq!(got.expanded_types, vec!["https://example.org/ns#Thing".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_import_is_reported() {
        let doc = json!({"@context": "http://127.0.0.1:1/openbadges/v1", "validation": []});
        let err = JsonLdExpander::default()
            .resolve(&fetcher(), "https://example.org/ctx.json", &doc, &[])
            .await
            .unwrap_err();
        assert!(err.contains("http://127.0.0.1:1/openbadges/v1"));
    }

    #[tokio::test]
    async fn documents_without_entries_are_rejected() {
        let ctx = "https://example.org/ctx.json";
        let x = JsonLdExpander::default();
        assert!(x.resolve(&fetcher(), ctx, &json!({"@context": {}}), &[]).await.is_err());
        assert!(x.resolve(&fetcher(), ctx, &json!([]), &[]).await.is_err());
    }

    #[tokio::test]
    async fn import_chains_are_bounded() {
        let server = MockServer::start().await;
        let base = server.uri();
        for i in 0..4 {
            serve(&server, &format!("/ctx/{i}"), json!({"@context": format!("{base}/ctx/{}", i + 1)})).await;
        }
        let doc = json!({"@context": format!("{base}/ctx/0")});
        let err = JsonLdExpander::with_max_contexts(3)
            .resolve(&fetcher(), &format!("{base}/root.json"), &doc, &[])
            .await
            .unwrap_err();
        assert!(err.contains("more than 3"));
    }

    #[test]
    fn imports_cover_scoped_contexts() {
        let doc = json!({
            "@context": [
                "https://w3id.org/openbadges/v1",
                {"evidence": {"@id": "obi:evidence", "@context": "scoped.json"}}
            ]
        });
        assert_eq!(
            context_imports("https://example.org/ext/context.json", &doc),
            vec![
                "https://w3id.org/openbadges/v1".to_string(),
                "https://example.org/ext/scoped.json".to_string()
            ]
        );
    }
}
