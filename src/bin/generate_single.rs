//! Single base path schema generation
//!
//! Generates every enabled entry of one base path. Unlike `generate-all`,
//! the first failure aborts the run.

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use resource_schemas::checkout::prepare_checkout;
use resource_schemas::{
    run_single, CommandGenerator, JsonReferenceStore, LocalSpecs, SchemaError, SchemasConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate-single")]
#[command(about = "Generate schemas for a single base path")]
struct Cli {
    /// Base path, e.g. "compute/resource-manager"
    #[arg(short, long)]
    base_path: String,

    /// Local specification checkout (otherwise the pinned remote is cloned)
    #[arg(short, long)]
    local_path: Option<PathBuf>,

    /// Config file layered over schemas.toml
    #[arg(short, long)]
    config: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SchemasConfig::load_from(cli.config.as_deref())
        .map_err(|e| format!("loading configuration: {}", e))?;

    let root = prepare_checkout(cli.local_path.as_deref(), &config.source, &config.checkout_dir())
        .map_err(|e| format!("preparing specification checkout: {}", e))?;
    let specs = LocalSpecs::new(&root, config.source.specs_dir.as_str())
        .with_declared_entries(config.entries.clone());
    let generator = CommandGenerator::new(&config.generator, config.catalog.trusted_base.as_str());
    let mut store = JsonReferenceStore::open(&config.references.path)?;

    let references = match run_single(&cli.base_path, &specs, &generator, &mut store) {
        Err(SchemaError::EntryPointNotFound { base_path, searched }) => {
            return Err(format!(
                "no readme.md found for base path '{}' (looked at {}). \
                 Base paths are relative to the '{}' directory, e.g. 'compute/resource-manager'.",
                base_path,
                searched,
                config.source.specs_dir
            )
            .into());
        }
        other => other?,
    };

    println!(
        "✅ Generated {} references for '{}' (saved to {:?})",
        references.len(),
        cli.base_path,
        store.path()
    );
    Ok(())
}
