//! Batch Generation
//!
//! Walks base paths in order, generating schemas for every enabled entry of
//! each one. Failures are isolated at two levels:
//!
//! - a base path whose entry-point document (or entry list) cannot be
//!   resolved is logged and skipped, with no package records;
//! - an entry whose generation fails is recorded as `failed` and its
//!   siblings still run.
//!
//! Results and log blocks come out in exactly the order base paths and
//! entries were processed.

pub mod report;
pub mod summary;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SchemaError};
use crate::references::{GeneratedReference, ReferenceStore};

pub use report::{PackageOutcome, PackageReport, PackageResult};
pub use summary::SummaryLog;

/// One declared unit of generation work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationEntry {
    pub base_path: String,
    pub namespace: String,
    /// Entry-point document to use instead of the base path's default,
    /// relative to the checkout root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_file: Option<String>,
    /// Excluded from generation, still listed
    #[serde(default)]
    pub disabled: bool,
}

impl GenerationEntry {
    pub fn new(base_path: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            namespace: namespace.into(),
            readme_file: None,
            disabled: false,
        }
    }
}

/// Access to the specification tree
pub trait SpecificationSource {
    /// Entry-point document for a base path
    fn entry_point(&self, base_path: &str) -> Result<PathBuf>;

    /// Entry-point document for an entry, honoring its override
    fn entry_point_for(&self, entry: &GenerationEntry) -> Result<PathBuf>;

    /// API versions declared by an entry-point document, grouped by namespace
    fn api_versions_by_namespace(&self, entry_point: &Path) -> Result<BTreeMap<String, Vec<String>>>;

    /// Declared or synthesized entries for a base path
    fn generation_entries(&self, base_path: &str, namespaces: &[String]) -> Result<Vec<GenerationEntry>>;

    /// Package identifier reported for an entry-point document
    fn package_name(&self, entry_point: &Path) -> String;
}

/// The external generation routine
pub trait SchemaGenerator {
    fn generate(&self, entry_point: &Path, entry: &GenerationEntry) -> Result<Vec<GeneratedReference>>;
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub packages: Vec<PackageResult>,
    pub references: Vec<GeneratedReference>,
}

impl BatchResult {
    fn merge(&mut self, other: BatchResult) {
        self.packages.extend(other.packages);
        self.references.extend(other.references);
    }

    pub fn failed_count(&self) -> usize {
        self.packages
            .iter()
            .filter(|p| p.result == PackageOutcome::Failed)
            .count()
    }
}

/// Select chunk `index` of `count` from `items`, preserving order.
///
/// Chunks hold `ceil(len / count)` items; trailing indexes may be empty.
pub fn partition<T: Clone>(items: &[T], index: usize, count: usize) -> Result<Vec<T>> {
    if count == 0 || index >= count {
        return Err(SchemaError::Config(format!(
            "batch index {} out of range for batch count {}",
            index, count
        )));
    }
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let size = items.len().div_ceil(count);
    Ok(items.chunks(size).nth(index).map(<[T]>::to_vec).unwrap_or_default())
}

/// Restrict entries to an allow-list of entry-point documents.
///
/// An entry survives when some allowed document lives under
/// `{specs_dir}/{base_path}/`; that document then becomes its entry point.
pub fn apply_allow_list(entries: Vec<GenerationEntry>, allowed: &[String], specs_dir: &str) -> Vec<GenerationEntry> {
    entries
        .into_iter()
        .filter_map(|mut entry| {
            let prefix = format!("{}/{}/", specs_dir, entry.base_path);
            let matched = allowed.iter().find(|doc| doc.starts_with(&prefix))?;
            entry.readme_file = Some(matched.clone());
            Some(entry)
        })
        .collect()
}

/// Enabled entries for a base path
fn enabled_entries<S: SpecificationSource>(specs: &S, base_path: &str) -> Result<Vec<GenerationEntry>> {
    let entry_point = specs.entry_point(base_path)?;
    let namespaces: Vec<String> = specs
        .api_versions_by_namespace(&entry_point)?
        .into_keys()
        .collect();
    let entries = specs.generation_entries(base_path, &namespaces)?;
    Ok(entries.into_iter().filter(|entry| !entry.disabled).collect())
}

/// Drives generation over many base paths
pub struct BatchRunner<'a, S, G> {
    specs: &'a S,
    generator: &'a G,
    specs_dir: String,
    package_paths: Vec<String>,
    allow_list: Option<Vec<String>>,
}

impl<'a, S: SpecificationSource, G: SchemaGenerator> BatchRunner<'a, S, G> {
    pub fn new(specs: &'a S, generator: &'a G) -> Self {
        Self {
            specs,
            generator,
            specs_dir: "specification".to_string(),
            package_paths: vec!["schemas".to_string()],
            allow_list: None,
        }
    }

    pub fn specs_dir(mut self, specs_dir: impl Into<String>) -> Self {
        self.specs_dir = specs_dir.into();
        self
    }

    pub fn package_paths(mut self, paths: Vec<String>) -> Self {
        self.package_paths = paths;
        self
    }

    /// Only process entries matching these entry-point documents
    pub fn allow_list(mut self, documents: Option<Vec<String>>) -> Self {
        self.allow_list = documents;
        self
    }

    /// Run every base path, then persist the merged reference list
    pub fn run<R, W>(
        &self,
        base_paths: &[String],
        store: &mut R,
        log: &mut SummaryLog<W>,
    ) -> Result<BatchResult>
    where
        R: ReferenceStore,
        W: Write,
    {
        let mut result = BatchResult::default();

        for base_path in base_paths {
            info!(base_path = %base_path, "processing base path");
            let entries = match self.prepare(base_path, store) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(base_path = %base_path, error = %e, "skipping base path");
                    log.failure(
                        &format!("Failed to resolve entry-point document for base path '{}'", base_path),
                        &e.to_string(),
                    )?;
                    continue;
                }
            };
            result.merge(self.generate_entries(&entries, log)?);
        }

        store.save(&result.references)?;
        Ok(result)
    }

    /// Enumerate, filter and clear the entries of one base path
    fn prepare<R: ReferenceStore>(&self, base_path: &str, store: &mut R) -> Result<Vec<GenerationEntry>> {
        let mut entries = enabled_entries(self.specs, base_path)?;
        if let Some(allowed) = &self.allow_list {
            entries = apply_allow_list(entries, allowed, &self.specs_dir);
        }
        store.clear(&entries)?;
        Ok(entries)
    }

    fn generate_entries<W: Write>(&self, entries: &[GenerationEntry], log: &mut SummaryLog<W>) -> Result<BatchResult> {
        let mut result = BatchResult::default();

        for entry in entries {
            match self.generate_entry(entry) {
                Ok((package_name, references)) => {
                    let files: Vec<String> = references.iter().map(|r| format!("- `{}`", r.reference)).collect();
                    log.success(
                        &format!(
                            "Generated types for base path '{}' and namespace '{}'",
                            entry.base_path, entry.namespace
                        ),
                        &files,
                    )?;
                    result.packages.push(PackageResult::succeeded(&self.package_paths, package_name));
                    result.references.extend(references);
                }
                Err(e) => {
                    warn!(base_path = %entry.base_path, namespace = %entry.namespace, error = %e, "generation failed");
                    log.failure(
                        &format!(
                            "Failed to generate types for base path '{}' and namespace '{}'",
                            entry.base_path, entry.namespace
                        ),
                        &e.to_string(),
                    )?;
                    result.packages.push(PackageResult::failed(&self.package_paths, &entry.base_path));
                }
            }
        }

        Ok(result)
    }

    fn generate_entry(&self, entry: &GenerationEntry) -> Result<(String, Vec<GeneratedReference>)> {
        let entry_point = self.specs.entry_point_for(entry)?;
        let references = self.generator.generate(&entry_point, entry)?;
        Ok((self.specs.package_name(&entry_point), references))
    }
}

/// Generate one base path without isolation; the first failure aborts.
pub fn run_single<S, G, R>(
    base_path: &str,
    specs: &S,
    generator: &G,
    store: &mut R,
) -> Result<Vec<GeneratedReference>>
where
    S: SpecificationSource,
    G: SchemaGenerator,
    R: ReferenceStore,
{
    let entries = enabled_entries(specs, base_path)?;
    store.clear(&entries)?;

    let mut references = Vec::new();
    for entry in &entries {
        let entry_point = specs.entry_point_for(entry)?;
        info!(base_path = %entry.base_path, namespace = %entry.namespace, "generating");
        references.extend(generator.generate(&entry_point, entry)?);
    }

    store.save(&references)?;
    Ok(references)
}
