//! Resource listing
//!
//! Follows every reference from the well-known root documents and prints
//! each resource type with the API versions known for it.

use clap::Parser;
use colored::Colorize;
use resource_schemas::{
    build_catalog, DocumentSource, HttpSource, MirrorSource, ResourceCatalog, SchemaLoader,
    SchemasConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "list-resources")]
#[command(about = "List resource types and their API versions")]
struct Cli {
    /// Print the catalog as JSON
    #[arg(long)]
    json: bool,

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
    let config = SchemasConfig::load_from(cli.config.as_deref())?;
    let base = config.catalog.trusted_base.clone();

    let catalog = match &config.catalog.mirror_dir {
        Some(dir) => catalog_from(MirrorSource::new(base.as_str(), dir), &base, &config.catalog.roots)?,
        None => catalog_from(HttpSource::new()?, &base, &config.catalog.roots)?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
    } else {
        print!("{}", catalog);
    }
    Ok(())
}

fn catalog_from<S: DocumentSource>(
    source: S,
    base: &str,
    roots: &[String],
) -> resource_schemas::Result<ResourceCatalog> {
    let loader = SchemaLoader::new(source, base);
    build_catalog(roots, &loader)
}
