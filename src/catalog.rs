//! Resource Catalog
//!
//! Turns a set of root schema documents into a map of resource type to the
//! API versions known for it. Type keys compare case-insensitively; the
//! casing seen first becomes the canonical key.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, info};

use crate::error::Result;
use crate::loader::{DocumentSource, ResourceEnums, SchemaLoader};
use crate::reference::{collect_refs, document_uri, is_under_base};

/// A single (resource type, API version) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceDescriptor {
    pub resource_type: String,
    pub api_version: String,
}

impl ResourceDescriptor {
    pub fn new(resource_type: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            api_version: api_version.into(),
        }
    }
}

/// Cross product of the two enumerations found at a resource schema
pub fn descriptors(enums: &ResourceEnums) -> Vec<ResourceDescriptor> {
    enums
        .types
        .iter()
        .flat_map(|ty| {
            enums
                .api_versions
                .iter()
                .map(move |version| ResourceDescriptor::new(ty.as_str(), version.as_str()))
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
struct CatalogEntry {
    canonical: String,
    versions: BTreeSet<String>,
}

/// Resource type -> known API versions
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    /// Keyed by the lower-cased type
    entries: BTreeMap<String, CatalogEntry>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: ResourceDescriptor) {
        let entry = self
            .entries
            .entry(descriptor.resource_type.to_lowercase())
            .or_insert_with(|| CatalogEntry {
                canonical: descriptor.resource_type,
                versions: BTreeSet::new(),
            });
        entry.versions.insert(descriptor.api_version);
    }

    /// Versions for a type, looked up case-insensitively
    pub fn versions(&self, resource_type: &str) -> Option<&BTreeSet<String>> {
        self.entries
            .get(&resource_type.to_lowercase())
            .map(|entry| &entry.versions)
    }

    /// Canonical casing recorded for a type
    pub fn canonical_type(&self, resource_type: &str) -> Option<&str> {
        self.entries
            .get(&resource_type.to_lowercase())
            .map(|entry| entry.canonical.as_str())
    }

    /// Iterate `(canonical type, versions)` ordered by lower-cased type
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.entries
            .values()
            .map(|entry| (entry.canonical.as_str(), &entry.versions))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Extend<ResourceDescriptor> for ResourceCatalog {
    fn extend<I: IntoIterator<Item = ResourceDescriptor>>(&mut self, iter: I) {
        for descriptor in iter {
            self.insert(descriptor);
        }
    }
}

impl Serialize for ResourceCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (resource_type, versions) in self.iter() {
            map.serialize_entry(resource_type, versions)?;
        }
        map.end()
    }
}

impl fmt::Display for ResourceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (resource_type, versions) in self.iter() {
            let versions: Vec<&str> = versions.iter().map(String::as_str).collect();
            writeln!(f, "{}: {}", resource_type, versions.join(", "))?;
        }
        Ok(())
    }
}

/// References worth resolving, in the order they were first reached:
/// under the trusted base, deduplicated by exact string, and not pointing
/// back at one of the roots.
pub fn candidate_references<S: DocumentSource>(
    roots: &[String],
    loader: &SchemaLoader<S>,
) -> Result<Vec<String>> {
    let mut candidates = Vec::new();
    let mut seen = HashSet::new();
    for root in roots {
        let document = loader.load_document(root)?;
        let refs = collect_refs(&document);
        debug!(root = %root, count = refs.len(), "collected references");
        for reference in refs {
            if is_under_base(&reference, loader.trusted_base()) && seen.insert(reference.clone()) {
                candidates.push(reference);
            }
        }
    }

    let root_uris: Vec<String> = roots.iter().map(|r| r.to_lowercase()).collect();
    candidates.retain(|r| !root_uris.contains(&document_uri(r).to_lowercase()));

    Ok(candidates)
}

/// Build the resource catalog reachable from `roots`.
///
/// References are resolved in traversal order, so the casing of the first
/// type reached becomes its canonical key.
///
/// The first reference that fails to resolve aborts the build.
pub fn build_catalog<S: DocumentSource>(
    roots: &[String],
    loader: &SchemaLoader<S>,
) -> Result<ResourceCatalog> {
    let candidates = candidate_references(roots, loader)?;
    info!(count = candidates.len(), "resolving resource references");

    let mut catalog = ResourceCatalog::new();
    for reference in &candidates {
        let enums = loader.resolve(reference)?;
        catalog.extend(descriptors(&enums));
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_product() {
        let enums = ResourceEnums {
            types: vec!["X".to_string(), "Y".to_string()],
            api_versions: vec!["v1".to_string(), "v2".to_string()],
        };
        let got: BTreeSet<_> = descriptors(&enums).into_iter().collect();
        let want: BTreeSet<_> = [
            ResourceDescriptor::new("X", "v1"),
            ResourceDescriptor::new("X", "v2"),
            ResourceDescriptor::new("Y", "v1"),
            ResourceDescriptor::new("Y", "v2"),
        ]
        .into_iter()
        .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_case_insensitive_merge_keeps_first_casing() {
        let mut catalog = ResourceCatalog::new();
        catalog.insert(ResourceDescriptor::new("Foo/Bar", "v1"));
        catalog.insert(ResourceDescriptor::new("foo/bar", "v2"));
        catalog.insert(ResourceDescriptor::new("FOO/BAR", "v1"));

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.canonical_type("foo/BAR"), Some("Foo/Bar"));
        let versions: Vec<_> = catalog.versions("Foo/Bar").unwrap().iter().cloned().collect();
        assert_eq!(versions, vec!["v1", "v2"]);
    }

    #[test]
    fn test_display_and_json() {
        let mut catalog = ResourceCatalog::new();
        catalog.insert(ResourceDescriptor::new("B/c", "2020-01-01"));
        catalog.insert(ResourceDescriptor::new("A/b", "2021-01-01"));
        catalog.insert(ResourceDescriptor::new("A/b", "2019-01-01"));

        assert_eq!(catalog.to_string(), "A/b: 2019-01-01, 2021-01-01\nB/c: 2020-01-01\n");
        assert_eq!(
            serde_json::to_value(&catalog).unwrap(),
            serde_json::json!({ "A/b": ["2019-01-01", "2021-01-01"], "B/c": ["2020-01-01"] })
        );
    }
}
