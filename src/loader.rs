//! Schema Loading
//!
//! Resolves a reference to the node it points at. Documents are fetched on
//! every lookup; nothing is cached between resolutions.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::reference::{fragment_segments, split_reference};

/// Somewhere schema documents can be fetched from, keyed by URI
pub trait DocumentSource {
    fn fetch(&self, uri: &str) -> Result<Value>;
}

impl DocumentSource for HashMap<String, Value> {
    fn fetch(&self, uri: &str) -> Result<Value> {
        self.get(uri).cloned().ok_or_else(|| SchemaError::Fetch {
            uri: uri.to_string(),
            message: "document not found".to_string(),
        })
    }
}

/// Fetches documents over HTTP(S)
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("resource-schemas/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&self, uri: &str) -> Result<Value> {
        debug!(uri, "fetching document");
        let response = self.client.get(uri).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SchemaError::Fetch {
                uri: uri.to_string(),
                message: format!("HTTP {}", status),
            });
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Reads documents from a local directory that mirrors a URI prefix
///
/// `https://host/schemas/a/b.json` with base `https://host/schemas/` maps to
/// `<root>/a/b.json`.
pub struct MirrorSource {
    base: String,
    root: PathBuf,
}

impl MirrorSource {
    pub fn new(base: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            base: base.into(),
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path under the mirror root; `None` when the URI is outside the base
    /// or its path would climb out of the root
    fn local_path(&self, uri: &str) -> Option<PathBuf> {
        let relative = Path::new(uri.strip_prefix(&self.base)?.trim_start_matches('/'));
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.root.join(relative))
    }
}

impl DocumentSource for MirrorSource {
    fn fetch(&self, uri: &str) -> Result<Value> {
        let path = self.local_path(uri).ok_or_else(|| SchemaError::Fetch {
            uri: uri.to_string(),
            message: format!("not under mirrored base {}", self.base),
        })?;
        debug!(uri, path = %path.display(), "reading mirrored document");
        let content = fs::read_to_string(&path).map_err(|e| SchemaError::Fetch {
            uri: uri.to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// The two enumerations found at a resource schema node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEnums {
    pub types: Vec<String>,
    pub api_versions: Vec<String>,
}

/// Resolves references that fall under a trusted base URI
pub struct SchemaLoader<S> {
    source: S,
    trusted_base: String,
}

impl<S: DocumentSource> SchemaLoader<S> {
    pub fn new(source: S, trusted_base: impl Into<String>) -> Self {
        Self {
            source,
            trusted_base: trusted_base.into(),
        }
    }

    pub fn trusted_base(&self) -> &str {
        &self.trusted_base
    }

    /// Fetch and parse a whole document
    pub fn load_document(&self, uri: &str) -> Result<Value> {
        self.source.fetch(uri)
    }

    /// Resolve a reference to the `type` and `apiVersion` enumerations of its target
    pub fn resolve(&self, reference: &str) -> Result<ResourceEnums> {
        let (uri, fragment) = split_reference(reference);
        if !uri.starts_with(&self.trusted_base) {
            return Err(SchemaError::InvalidReference {
                reference: reference.to_string(),
                base: self.trusted_base.clone(),
            });
        }

        let document = self.load_document(uri)?;
        let node = descend(&document, fragment).ok_or_else(|| SchemaError::MalformedSchema {
            reference: reference.to_string(),
            reason: "fragment does not resolve to a node".to_string(),
        })?;

        Ok(ResourceEnums {
            types: property_enum(node, "type", reference)?,
            api_versions: property_enum(node, "apiVersion", reference)?,
        })
    }
}

fn descend<'a>(document: &'a Value, fragment: &str) -> Option<&'a Value> {
    fragment_segments(fragment).try_fold(document, |node, segment| match node {
        Value::Object(obj) => obj.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn property_enum(node: &Value, property: &str, reference: &str) -> Result<Vec<String>> {
    let malformed = |reason: String| SchemaError::MalformedSchema {
        reference: reference.to_string(),
        reason,
    };

    let values = node
        .get("properties")
        .and_then(|props| props.get(property))
        .and_then(|prop| prop.get("enum"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| malformed(format!("missing properties.{}.enum", property)))?;

    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| malformed(format!("non-string value in properties.{}.enum", property)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const BASE: &str = "https://schemas.test/schemas/";

    fn resource_doc() -> Value {
        json!({
            "resourceDefinitions": {
                "vaults": {
                    "properties": {
                        "type": { "enum": ["Microsoft.KeyVault/vaults"] },
                        "apiVersion": { "enum": ["2019-09-01", "2021-10-01"] }
                    }
                },
                "broken": {
                    "properties": { "type": { "enum": ["Microsoft.KeyVault/broken"] } }
                }
            }
        })
    }

    fn loader() -> SchemaLoader<HashMap<String, Value>> {
        let mut docs = HashMap::new();
        docs.insert(format!("{}2019-09-01/Microsoft.KeyVault.json", BASE), resource_doc());
        SchemaLoader::new(docs, BASE)
    }

    #[test]
    fn test_resolve_returns_both_enums() {
        let enums = loader()
            .resolve(&format!("{}2019-09-01/Microsoft.KeyVault.json#/resourceDefinitions/vaults", BASE))
            .unwrap();
        assert_eq!(enums.types, vec!["Microsoft.KeyVault/vaults"]);
        assert_eq!(enums.api_versions, vec!["2019-09-01", "2021-10-01"]);
    }

    #[test]
    fn test_untrusted_reference_is_rejected() {
        let result = loader().resolve("https://elsewhere.test/a.json#/resourceDefinitions/x");
        assert!(matches!(result, Err(SchemaError::InvalidReference { .. })));
    }

    #[test]
    fn test_missing_api_version_enum_is_malformed() {
        let result = loader()
            .resolve(&format!("{}2019-09-01/Microsoft.KeyVault.json#/resourceDefinitions/broken", BASE));
        assert!(matches!(result, Err(SchemaError::MalformedSchema { .. })));
    }

    #[test]
    fn test_unresolvable_fragment_is_malformed() {
        let result = loader()
            .resolve(&format!("{}2019-09-01/Microsoft.KeyVault.json#/resourceDefinitions/nope", BASE));
        assert!(matches!(result, Err(SchemaError::MalformedSchema { .. })));
    }

    #[test]
    fn test_mirror_source_reads_from_disk() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2019-09-01")).unwrap();
        fs::write(
            dir.path().join("2019-09-01/Microsoft.KeyVault.json"),
            serde_json::to_string(&resource_doc()).unwrap(),
        )
        .unwrap();

        let loader = SchemaLoader::new(MirrorSource::new(BASE, dir.path()), BASE);
        let enums = loader
            .resolve(&format!("{}2019-09-01/Microsoft.KeyVault.json#/resourceDefinitions/vaults", BASE))
            .unwrap();
        assert_eq!(enums.api_versions.len(), 2);
    }

    #[test]
    fn test_mirror_source_stays_inside_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("mirror");
        fs::create_dir_all(root.join("2019-09-01")).unwrap();
        fs::write(dir.path().join("outside.json"), "{}").unwrap();

        let source = MirrorSource::new(BASE, &root);
        for uri in [
            format!("{}../outside.json", BASE),
            format!("{}2019-09-01/../../outside.json", BASE),
        ] {
            match source.fetch(&uri) {
                Err(SchemaError::Fetch { message, .. }) => {
                    assert!(message.contains("not under mirrored base"), "{}", message)
                }
                other => panic!("expected fetch error for {}, got {:?}", uri, other),
            }
        }
    }
}
