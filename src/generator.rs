//! External schema generator
//!
//! Runs the configured generator command for one entry, then reads the
//! schema files it wrote for the entry's namespace and turns each resource
//! definition into a [`GeneratedReference`].

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::batch::{GenerationEntry, SchemaGenerator};
use crate::config::GeneratorConfig;
use crate::error::{Result, SchemaError};
use crate::references::GeneratedReference;
use crate::specs::to_slash;

/// Top-level sections of a generated schema that hold resource definitions
const DEFINITION_SCOPES: &[&str] = &[
    "resourceDefinitions",
    "subscription_resourceDefinitions",
    "managementGroup_resourceDefinitions",
    "tenant_resourceDefinitions",
    "extension_resourceDefinitions",
];

/// Generator backed by an external command
pub struct CommandGenerator {
    command: String,
    args: Vec<String>,
    output_dir: PathBuf,
    schema_base: String,
}

impl CommandGenerator {
    /// `schema_base` prefixes the relative file path in every emitted reference
    pub fn new(config: &GeneratorConfig, schema_base: impl Into<String>) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            output_dir: config.output_dir.clone(),
            schema_base: schema_base.into(),
        }
    }

    fn render_args(&self, entry_point: &Path, entry: &GenerationEntry) -> Vec<String> {
        let readme = entry_point.display().to_string();
        let output = self.output_dir.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{readme}", &readme)
                    .replace("{output}", &output)
                    .replace("{namespace}", &entry.namespace)
            })
            .collect()
    }

    /// References for every resource definition written for `entry`
    pub fn collect_references(&self, entry: &GenerationEntry) -> Result<Vec<GeneratedReference>> {
        let mut references = Vec::new();
        if !self.output_dir.is_dir() {
            return Ok(references);
        }

        for file in WalkDir::new(&self.output_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = file.path();
            if !file.file_type().is_file() || !is_namespace_schema(path, &entry.namespace) {
                continue;
            }

            let relative = path
                .strip_prefix(&self.output_dir)
                .map(to_slash)
                .unwrap_or_else(|_| to_slash(path));
            let content = fs::read_to_string(path)?;
            let schema: Value = serde_json::from_str(&content)?;

            for scope in DEFINITION_SCOPES {
                let Some(definitions) = schema.get(*scope).and_then(Value::as_object) else {
                    continue;
                };
                for name in definitions.keys() {
                    references.push(GeneratedReference {
                        base_path: entry.base_path.clone(),
                        namespace: entry.namespace.clone(),
                        file: relative.clone(),
                        reference: format!("{}{}#/{}/{}", self.schema_base, relative, scope, name),
                    });
                }
            }
        }

        debug!(namespace = %entry.namespace, count = references.len(), "collected generated references");
        Ok(references)
    }
}

impl SchemaGenerator for CommandGenerator {
    fn generate(&self, entry_point: &Path, entry: &GenerationEntry) -> Result<Vec<GeneratedReference>> {
        let args = self.render_args(entry_point, entry);
        info!(command = %self.command, namespace = %entry.namespace, "running generator");

        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|e| SchemaError::Generation {
                base_path: entry.base_path.clone(),
                message: format!("could not start '{}': {}", self.command, e),
            })?;

        if !output.status.success() {
            return Err(SchemaError::Generation {
                base_path: entry.base_path.clone(),
                message: format!(
                    "'{}' exited with {}\n{}",
                    self.command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim_end()
                ),
            });
        }

        self.collect_references(entry)
    }
}

fn is_namespace_schema(path: &Path, namespace: &str) -> bool {
    path.extension().map(|ext| ext == "json").unwrap_or(false)
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|stem| stem.eq_ignore_ascii_case(namespace))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn generator(output_dir: &Path, command: &str, args: &[&str]) -> CommandGenerator {
        let config = GeneratorConfig {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            output_dir: output_dir.to_path_buf(),
        };
        CommandGenerator::new(&config, "https://host/schemas/")
    }

    fn write_schema(dir: &Path, relative: &str, schema: Value) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string(&schema).unwrap()).unwrap();
    }

    #[test]
    fn test_collect_references_per_scope() {
        let dir = tempdir().unwrap();
        write_schema(
            dir.path(),
            "2021-03-01/Microsoft.Compute.json",
            json!({
                "resourceDefinitions": { "virtualMachines": {}, "disks": {} },
                "subscription_resourceDefinitions": { "quotas": {} }
            }),
        );
        write_schema(
            dir.path(),
            "2021-03-01/Microsoft.Network.json",
            json!({ "resourceDefinitions": { "virtualNetworks": {} } }),
        );

        let entry = GenerationEntry::new("compute/resource-manager", "Microsoft.Compute");
        let refs = generator(dir.path(), "true", &[]).collect_references(&entry).unwrap();
        let refs: Vec<_> = refs.iter().map(|r| r.reference.as_str()).collect();

        assert_eq!(
            refs,
            vec![
                "https://host/schemas/2021-03-01/Microsoft.Compute.json#/resourceDefinitions/virtualMachines",
                "https://host/schemas/2021-03-01/Microsoft.Compute.json#/resourceDefinitions/disks",
                "https://host/schemas/2021-03-01/Microsoft.Compute.json#/subscription_resourceDefinitions/quotas",
            ]
        );
    }

    #[test]
    fn test_render_args() {
        let command = generator(Path::new("out"), "autorest", &["--output-folder={output}", "{readme}", "--ns={namespace}"]);
        let entry = GenerationEntry::new("compute/resource-manager", "Microsoft.Compute");
        assert_eq!(
            command.render_args(Path::new("spec/readme.md"), &entry),
            vec!["--output-folder=out", "spec/readme.md", "--ns=Microsoft.Compute"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_generation_error() {
        let dir = tempdir().unwrap();
        let entry = GenerationEntry::new("compute/resource-manager", "Microsoft.Compute");
        let result = generator(dir.path(), "false", &[]).generate(Path::new("readme.md"), &entry);
        assert!(matches!(result, Err(SchemaError::Generation { .. })));
    }

    #[test]
    fn test_missing_command_is_generation_error() {
        let dir = tempdir().unwrap();
        let entry = GenerationEntry::new("compute/resource-manager", "Microsoft.Compute");
        let result = generator(dir.path(), "no-such-generator-binary", &[]).generate(Path::new("readme.md"), &entry);
        assert!(matches!(result, Err(SchemaError::Generation { .. })));
    }
}
