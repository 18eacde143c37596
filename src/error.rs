use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TrackerError {
    #[error("invalid genome accession: {0}")]
    InvalidAccession(String),

    #[error("invalid taxon id: {0}")]
    InvalidTaxonId(String),

    #[error("invalid project accession: {0}")]
    InvalidProjectAccession(String),

    #[error("unknown metadata field: {0}")]
    UnknownField(String),

    #[error("key field index {index} out of bounds for {count} configured fields")]
    KeyIndexOutOfBounds { index: usize, count: usize },

    #[error("field at key index {index} is {found:?}, expected \"accession\"")]
    KeyFieldMismatch { index: usize, found: String },

    #[error("missing config file asm-track.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("NCBI Datasets request failed: {0}")]
    DatasetsHttp(String),

    #[error("NCBI Datasets returned status {status}: {message}")]
    DatasetsStatus { status: u16, message: String },

    #[error("unexpected NCBI Datasets payload: {0}")]
    DatasetsPayload(String),

    #[error("malformed matrix {path}: line {line} has {found} fields, expected {expected}")]
    MalformedMatrix {
        path: String,
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("failed to persist matrix {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
