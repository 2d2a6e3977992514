//! Package report
//!
//! One record per processed generation entry, in processing order. Written
//! as `{ "packages": [ { "path": [...], "packageName": ..., "result": ... } ] }`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageResult {
    pub path: Vec<String>,
    /// Package identifier on success, base path on failure
    pub package_name: String,
    pub result: PackageOutcome,
}

impl PackageResult {
    pub fn succeeded(path: &[String], package_name: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            package_name: package_name.into(),
            result: PackageOutcome::Succeeded,
        }
    }

    pub fn failed(path: &[String], base_path: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            package_name: base_path.into(),
            result: PackageOutcome::Failed,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageReport {
    pub packages: Vec<PackageResult>,
}

impl PackageReport {
    pub fn new(packages: Vec<PackageResult>) -> Self {
        Self { packages }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
