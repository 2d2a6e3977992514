//! Generated reference persistence
//!
//! Every generation run produces references to the resource definitions it
//! wrote. They are kept in one sorted JSON list; a run first clears what it
//! is about to regenerate, then merges its own output with whatever was
//! carried over from earlier runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::GenerationEntry;
use crate::error::Result;

/// One generated resource definition
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReference {
    pub base_path: String,
    pub namespace: String,
    /// Generated schema file, relative to the output directory
    pub file: String,
    /// `{trusted_base}{file}#/{scope}/{name}`
    #[serde(rename = "$ref")]
    pub reference: String,
}

impl GeneratedReference {
    /// Whether this reference was produced for `entry`
    pub fn belongs_to(&self, entry: &GenerationEntry) -> bool {
        self.base_path.eq_ignore_ascii_case(&entry.base_path)
            && self.namespace.eq_ignore_ascii_case(&entry.namespace)
    }
}

/// Storage for the generated reference list
pub trait ReferenceStore {
    /// Forget references previously recorded for `entries`
    fn clear(&mut self, entries: &[GenerationEntry]) -> Result<()>;

    /// Merge `references` with the carried-over list and persist it
    fn save(&mut self, references: &[GeneratedReference]) -> Result<()>;
}

/// Reference list stored as a JSON file
#[derive(Debug)]
pub struct JsonReferenceStore {
    path: PathBuf,
    carried: Vec<GeneratedReference>,
}

impl JsonReferenceStore {
    /// Open the list at `path`; a missing file starts empty
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let carried = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };
        Ok(Self { path, carried })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// References currently held (carried over plus saved)
    pub fn references(&self) -> &[GeneratedReference] {
        &self.carried
    }
}

impl ReferenceStore for JsonReferenceStore {
    fn clear(&mut self, entries: &[GenerationEntry]) -> Result<()> {
        let before = self.carried.len();
        self.carried
            .retain(|reference| !entries.iter().any(|entry| reference.belongs_to(entry)));
        debug!(removed = before - self.carried.len(), "cleared stale references");
        Ok(())
    }

    fn save(&mut self, references: &[GeneratedReference]) -> Result<()> {
        self.carried.extend_from_slice(references);
        self.carried.sort();
        self.carried.dedup();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.carried)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
