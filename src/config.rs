//! Configuration management
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemas.toml)
//! - Environment variables (SCHEMAS__*)
//!
//! ## Example config file (schemas.toml):
//! ```toml
//! [source]
//! remote_url = "https://github.com/Azure/azure-rest-api-specs"
//! pinned_commit = "main"
//!
//! [catalog]
//! trusted_base = "https://schema.management.azure.com/schemas/"
//! mirror_dir = "./schemas"
//!
//! [generator]
//! command = "autorest"
//! output_dir = "./schemas"
//!
//! [[entries]]
//! base_path = "compute/resource-manager"
//! namespace = "Microsoft.Compute"
//!
//! [[entries]]
//! base_path = "legacy/resource-manager"
//! namespace = "Microsoft.Legacy"
//! disabled = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::batch::GenerationEntry;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemasConfig {
    /// Specification source checkout
    #[serde(default)]
    pub source: SourceConfig,

    /// Resource catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// External generator invocation
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Persisted generated reference list
    #[serde(default)]
    pub references: ReferencesConfig,

    /// Package report and summary log
    #[serde(default)]
    pub report: ReportConfig,

    /// Explicitly declared generation entries
    #[serde(default)]
    pub entries: Vec<GenerationEntry>,
}

/// Where the specification tree comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Remote repository cloned when no local checkout is given
    #[serde(default = "default_remote_url")]
    pub remote_url: String,

    /// Revision the remote is checked out at
    #[serde(default = "default_pinned_commit")]
    pub pinned_commit: String,

    /// Clone destination (defaults to the user cache dir)
    #[serde(default)]
    pub checkout_dir: Option<PathBuf>,

    /// Directory under the checkout that holds base paths
    #[serde(default = "default_specs_dir")]
    pub specs_dir: String,
}

/// Resource listing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// References outside this prefix are never resolved
    #[serde(default = "default_trusted_base")]
    pub trusted_base: String,

    /// Well-known root documents the catalog starts from
    #[serde(default = "default_roots")]
    pub roots: Vec<String>,

    /// Local directory mirroring `trusted_base`; read instead of HTTP when set
    #[serde(default)]
    pub mirror_dir: Option<PathBuf>,
}

/// External generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Executable to run per entry
    #[serde(default = "default_generator_command")]
    pub command: String,

    /// Arguments; `{readme}`, `{output}` and `{namespace}` are substituted
    #[serde(default = "default_generator_args")]
    pub args: Vec<String>,

    /// Where generated schemas are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Generated reference persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencesConfig {
    #[serde(default = "default_references_path")]
    pub path: PathBuf,
}

/// Reporting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// `path` written for every package report record
    #[serde(default = "default_package_paths")]
    pub package_paths: Vec<String>,

    /// Summary log file name, placed beside the checkout
    #[serde(default = "default_summary_file_name")]
    pub summary_file_name: String,
}

// Default value functions
fn default_remote_url() -> String {
    "https://github.com/Azure/azure-rest-api-specs".to_string()
}

fn default_pinned_commit() -> String {
    "main".to_string()
}

fn default_specs_dir() -> String {
    "specification".to_string()
}

fn default_trusted_base() -> String {
    "https://schema.management.azure.com/schemas/".to_string()
}

fn default_roots() -> Vec<String> {
    [
        "2019-04-01/deploymentTemplate.json",
        "2018-05-01/subscriptionDeploymentTemplate.json",
        "2019-08-01/managementGroupDeploymentTemplate.json",
        "2019-08-01/tenantDeploymentTemplate.json",
    ]
    .iter()
    .map(|root| format!("{}{}", default_trusted_base(), root))
    .collect()
}

fn default_generator_command() -> String {
    "autorest".to_string()
}

fn default_generator_args() -> Vec<String> {
    vec![
        "--azureresourceschema".to_string(),
        "--multiapi".to_string(),
        "--title=none".to_string(),
        "--output-folder={output}".to_string(),
        "{readme}".to_string(),
    ]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_references_path() -> PathBuf {
    PathBuf::from("generated-references.json")
}

fn default_package_paths() -> Vec<String> {
    vec!["schemas".to_string()]
}

fn default_summary_file_name() -> String {
    "summary.log".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            remote_url: default_remote_url(),
            pinned_commit: default_pinned_commit(),
            checkout_dir: None,
            specs_dir: default_specs_dir(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            trusted_base: default_trusted_base(),
            roots: default_roots(),
            mirror_dir: None,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: default_generator_command(),
            args: default_generator_args(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            path: default_references_path(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            package_paths: default_package_paths(),
            summary_file_name: default_summary_file_name(),
        }
    }
}

impl SchemasConfig {
    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["schemas.toml", ".schemas.toml", "config/schemas.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "resource-schemas", "resource-schemas") {
            let xdg_config = config_dir.config_dir().join("schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMAS__CATALOG__MIRROR_DIR=... etc.
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Clone destination, falling back to the user cache directory
    pub fn checkout_dir(&self) -> PathBuf {
        if let Some(dir) = &self.source.checkout_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("dev", "resource-schemas", "resource-schemas")
            .map(|dirs| dirs.cache_dir().join("specs"))
            .unwrap_or_else(|| std::env::temp_dir().join("resource-schemas-specs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemasConfig::default();
        assert_eq!(config.catalog.roots.len(), 4);
        assert!(config
            .catalog
            .roots
            .iter()
            .all(|root| root.starts_with(&config.catalog.trusted_base)));
        assert_eq!(config.report.package_paths, vec!["schemas"]);
    }

    #[test]
    fn test_serialize_config() {
        let config = SchemasConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[catalog]"));
        assert!(toml_str.contains("[generator]"));
    }

    #[test]
    fn test_entries_from_toml() {
        let config: SchemasConfig = toml::from_str(
            r#"
            [[entries]]
            base_path = "compute/resource-manager"
            namespace = "Microsoft.Compute"

            [[entries]]
            base_path = "compute/resource-manager"
            namespace = "Microsoft.Legacy"
            disabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.entries.len(), 2);
        assert_eq!(config.entries[0].namespace, "Microsoft.Compute");
        assert!(config.entries[1].disabled);
        assert!(config.entries[0].readme_file.is_none());
    }

    #[test]
    fn test_save_then_load_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemas.toml");
        let path = path.to_str().unwrap();

        let mut config = SchemasConfig::default();
        config.source.pinned_commit = "abc123".to_string();
        config.catalog.mirror_dir = Some(PathBuf::from("/srv/mirror"));
        config.entries.push(GenerationEntry::new("compute/resource-manager", "Microsoft.Compute"));
        config.save(path).unwrap();

        let loaded = SchemasConfig::load_from(Some(path)).unwrap();
        assert_eq!(loaded.source.pinned_commit, "abc123");
        assert_eq!(loaded.catalog.mirror_dir, Some(PathBuf::from("/srv/mirror")));
        assert_eq!(loaded.catalog.roots, config.catalog.roots);
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].base_path, "compute/resource-manager");

        // Environment wins over the file
        std::env::set_var("SCHEMAS__CATALOG__TRUSTED_BASE", "https://mirror.test/schemas/");
        let overridden = SchemasConfig::load_from(Some(path));
        std::env::remove_var("SCHEMAS__CATALOG__TRUSTED_BASE");

        let overridden = overridden.unwrap();
        assert_eq!(overridden.catalog.trusted_base, "https://mirror.test/schemas/");
        assert_eq!(overridden.source.pinned_commit, "abc123");
    }
}
