//! Resource Schemas
//!
//! Catalogs ARM resource types and drives batch schema generation over a
//! specification tree.
//!
//! ## Features
//!
//! - **Resource Catalog**: Follows `$ref`s from well-known root documents to
//!   every resource schema and records the API versions known per type
//! - **Batch Generation**: Runs the external generator for every base path,
//!   isolating failures per base path and per entry
//! - **Static Partitioning**: Splits base paths into order-preserving chunks
//!   so independent processes can share a run
//! - **Summary Log**: Markdown log on the console and on disk
//!
//! ## Architecture
//!
//! ```text
//! list-resources:   roots ─► reference ─► loader ─► catalog ─► stdout
//!
//! generate-all:     checkout ─► specs ─► batch ─► generator ─► references
//!                                          │
//!                                          └─► summary log / package report
//! ```

pub mod batch;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod reference;
pub mod references;
pub mod specs;

pub use batch::{
    partition, run_single, BatchResult, BatchRunner, GenerationEntry, PackageOutcome, PackageReport,
    PackageResult, SchemaGenerator, SpecificationSource, SummaryLog,
};
pub use catalog::{build_catalog, ResourceCatalog, ResourceDescriptor};
pub use config::SchemasConfig;
pub use error::{Result, SchemaError};
pub use generator::CommandGenerator;
pub use loader::{DocumentSource, HttpSource, MirrorSource, ResourceEnums, SchemaLoader};
pub use references::{GeneratedReference, JsonReferenceStore, ReferenceStore};
pub use specs::LocalSpecs;
