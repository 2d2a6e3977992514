//! Full-batch schema generation
//!
//! Generates schemas for every base path in the specification tree (or one
//! chunk of them), logging each success and failure to a markdown summary.
//! Failures of individual base paths or entries never abort the run.

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use resource_schemas::checkout::prepare_checkout;
use resource_schemas::{
    partition, BatchRunner, CommandGenerator, JsonReferenceStore, LocalSpecs, PackageReport,
    SchemasConfig, SummaryLog,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate-all")]
#[command(about = "Generate schemas for every base path in the specification tree")]
struct Cli {
    /// Local specification checkout (otherwise the pinned remote is cloned)
    #[arg(short, long)]
    local_path: Option<PathBuf>,

    /// Index of the chunk to process (requires --batch-count)
    #[arg(long, requires = "batch_count")]
    batch_index: Option<usize>,

    /// Number of chunks the base paths are split into (requires --batch-index)
    #[arg(long, requires = "batch_index")]
    batch_count: Option<usize>,

    /// Only generate for these entry-point documents (repo-relative, comma separated)
    #[arg(long, value_delimiter = ',')]
    readme_files: Option<Vec<String>>,

    /// Write a JSON package report here
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// Summary log path (default: beside the checkout)
    #[arg(long)]
    summary_log_path: Option<PathBuf>,

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

    let mut base_paths = specs.base_paths()?;
    if let (Some(index), Some(count)) = (cli.batch_index, cli.batch_count) {
        base_paths = partition(&base_paths, index, count)?;
        println!("📦 Batch {}/{}: {} base paths", index + 1, count, base_paths.len());
    } else if cli.batch_index.is_some() || cli.batch_count.is_some() {
        return Err("--batch-index and --batch-count must be given together".into());
    }

    let summary_path = cli.summary_log_path.unwrap_or_else(|| {
        root.parent()
            .unwrap_or(root.as_path())
            .join(&config.report.summary_file_name)
    });
    let mut log = SummaryLog::create(&summary_path)
        .map_err(|e| format!("creating summary log {}: {}", summary_path.display(), e))?;
    log.line(&format!(
        "## Schema generation ({})",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ))?;
    log.line("")?;

    let generator = CommandGenerator::new(&config.generator, config.catalog.trusted_base.as_str());
    let mut store = JsonReferenceStore::open(&config.references.path)?;

    let result = BatchRunner::new(&specs, &generator)
        .specs_dir(config.source.specs_dir.as_str())
        .package_paths(config.report.package_paths.clone())
        .allow_list(cli.readme_files)
        .run(&base_paths, &mut store, &mut log)?;

    log.line("")?;
    log.line(&format!(
        "{} packages processed, {} failed, {} references generated",
        result.packages.len(),
        result.failed_count(),
        result.references.len()
    ))?;
    log.close()?;

    if let Some(output_path) = cli.output_path {
        PackageReport::new(result.packages)
            .write(&output_path)
            .map_err(|e| format!("writing package report {}: {}", output_path.display(), e))?;
        println!("✅ Package report written to {:?}", output_path);
    }

    println!("📝 Summary log written to {:?}", summary_path);
    Ok(())
}
