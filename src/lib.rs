//! Incremental tracker for NCBI genome assemblies.
//!
//! Queries the Datasets API for two accession lists (all assemblies under a
//! root taxon, and assemblies of one tracked BioProject), intersects them,
//! fetches metadata for the common accessions, and appends genuinely new rows
//! to an append-only TSV matrix, each tagged with a derived download URL.

pub mod config;
pub mod datasets;
pub mod domain;
pub mod error;
pub mod matrix;
pub mod output;
pub mod pipeline;
pub mod setops;
