//! Local specification checkout
//!
//! Layout expected under the checkout root:
//!
//! ```text
//! specification/
//! ├── compute/
//! │   └── resource-manager/
//! │       ├── readme.md
//! │       └── Microsoft.Compute/stable/2021-03-01/compute.json
//! └── network/
//!     └── resource-manager/
//!         └── readme.md
//! ```
//!
//! A base path is `<service>/resource-manager`; its entry-point document is
//! the `readme.md` in that directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::batch::{GenerationEntry, SpecificationSource};
use crate::error::{Result, SchemaError};

const ENTRY_POINT_FILE: &str = "readme.md";
const SURFACE_DIR: &str = "resource-manager";

fn input_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([A-Za-z][A-Za-z0-9]*(?:\.[A-Za-z0-9]+)+)/(?:stable|preview)/(\d{4}-\d{2}-\d{2}(?:-[A-Za-z0-9]+)*)/[^\s/]+\.json")
            .expect("valid input-file regex")
    })
}

/// Group API versions by namespace from input-file paths mentioned in a readme
pub fn parse_api_versions(readme: &str) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for captures in input_file_pattern().captures_iter(readme) {
        grouped
            .entry(captures[1].to_string())
            .or_default()
            .insert(captures[2].to_string());
    }
    grouped
        .into_iter()
        .map(|(namespace, versions)| (namespace, versions.into_iter().collect()))
        .collect()
}

/// Specification tree on the local filesystem
pub struct LocalSpecs {
    root: PathBuf,
    specs_dir: String,
    declared: Vec<GenerationEntry>,
}

impl LocalSpecs {
    pub fn new(root: impl AsRef<Path>, specs_dir: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            specs_dir: specs_dir.into(),
            declared: Vec::new(),
        }
    }

    /// Entries declared in configuration, preferred over synthesized ones
    pub fn with_declared_entries(mut self, entries: Vec<GenerationEntry>) -> Self {
        self.declared = entries;
        self
    }

    fn specs_path(&self) -> PathBuf {
        self.root.join(&self.specs_dir)
    }

    /// Every `<service>/resource-manager` directory that has a readme, sorted
    pub fn base_paths(&self) -> Result<Vec<String>> {
        let specs = self.specs_path();
        if !specs.is_dir() {
            return Err(SchemaError::Config(format!(
                "specification directory not found: {}",
                specs.display()
            )));
        }

        let mut base_paths: Vec<String> = WalkDir::new(&specs)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && e.file_name() == SURFACE_DIR)
            .filter(|e| e.path().join(ENTRY_POINT_FILE).is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&specs).ok()?;
                Some(to_slash(relative))
            })
            .collect();
        base_paths.sort();
        Ok(base_paths)
    }
}

impl SpecificationSource for LocalSpecs {
    fn entry_point(&self, base_path: &str) -> Result<PathBuf> {
        let candidate = self.specs_path().join(base_path).join(ENTRY_POINT_FILE);
        if candidate.is_file() {
            Ok(candidate)
        } else {
            Err(SchemaError::EntryPointNotFound {
                base_path: base_path.to_string(),
                searched: candidate.display().to_string(),
            })
        }
    }

    fn entry_point_for(&self, entry: &GenerationEntry) -> Result<PathBuf> {
        match &entry.readme_file {
            Some(readme) => {
                let candidate = self.root.join(readme);
                if candidate.is_file() {
                    Ok(candidate)
                } else {
                    Err(SchemaError::EntryPointNotFound {
                        base_path: entry.base_path.clone(),
                        searched: candidate.display().to_string(),
                    })
                }
            }
            None => self.entry_point(&entry.base_path),
        }
    }

    fn api_versions_by_namespace(&self, entry_point: &Path) -> Result<BTreeMap<String, Vec<String>>> {
        let content = fs::read_to_string(entry_point)?;
        Ok(parse_api_versions(&content))
    }

    fn generation_entries(&self, base_path: &str, namespaces: &[String]) -> Result<Vec<GenerationEntry>> {
        let declared: Vec<GenerationEntry> = self
            .declared
            .iter()
            .filter(|entry| entry.base_path.eq_ignore_ascii_case(base_path))
            .filter(|entry| {
                namespaces.is_empty()
                    || namespaces.iter().any(|ns| ns.eq_ignore_ascii_case(&entry.namespace))
            })
            .cloned()
            .collect();

        if !declared.is_empty() {
            return Ok(declared);
        }

        Ok(namespaces
            .iter()
            .map(|namespace| GenerationEntry::new(base_path, namespace.as_str()))
            .collect())
    }

    fn package_name(&self, entry_point: &Path) -> String {
        let dir = entry_point.parent().unwrap_or(entry_point);
        match dir.strip_prefix(self.specs_path()) {
            Ok(relative) => to_slash(relative),
            Err(_) => to_slash(dir),
        }
    }
}

/// Join path components with `/`
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
