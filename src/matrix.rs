use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;

use camino::Utf8Path;
use tracing::{debug, info};

use crate::domain::MetadataRecord;
use crate::error::TrackerError;
use crate::setops::dedup_by_key;

/// Header name of the derived column appended to every persisted row.
pub const DERIVED_FIELD_NAME: &str = "download-url";

const DOWNLOAD_URL_BASE: &str = "https://api.ncbi.nlm.nih.gov/datasets/v2/genome/accession";

/// Pure and deterministic; distinct accessions map to distinct URLs because
/// the accession is the final path segment.
pub fn derive_download_url(key: &str) -> String {
    format!("{DOWNLOAD_URL_BASE}/{key}?download=true&gzip=true")
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateOutcome {
    pub appended: usize,
    pub bootstrapped: bool,
}

#[derive(Debug, Clone)]
pub struct MatrixStatus {
    pub path: String,
    pub rows: usize,
    pub last_key: Option<String>,
}

/// Merges a deduplicated batch into the matrix at `path`.
///
/// Absent file is the bootstrap case: header plus the whole batch, written to
/// a temp file and renamed into place. Existing file: rows whose key is
/// already present are skipped, the remainder is serialized fully in memory
/// and appended in a single write. Existing bytes are never rewritten, so an
/// interrupted run leaves the matrix in the pre-update state.
///
/// Callers must guarantee at most one update per matrix file is in flight;
/// this function takes no lock of its own.
pub fn update(
    path: &Utf8Path,
    batch: &[MetadataRecord],
    field_names: &[String],
    key_index: usize,
    dry_run: bool,
) -> Result<UpdateOutcome, TrackerError> {
    // The pipeline dedups upstream, but update guards its own key-uniqueness
    // invariant against callers that hand it a raw batch.
    let batch = dedup_by_key(batch.to_vec(), key_index);

    if !path.as_std_path().exists() {
        return bootstrap(path, &batch, field_names, key_index, dry_run);
    }

    let existing = load_existing_keys(path, key_index, field_names.len() + 1)?;
    let new_records: Vec<&MetadataRecord> = batch
        .iter()
        .filter(|record| {
            record
                .key(key_index)
                .map(|key| !existing.contains(key))
                .unwrap_or(false)
        })
        .collect();

    if new_records.is_empty() {
        debug!(matrix = %path, "no new records to append");
        return Ok(UpdateOutcome {
            appended: 0,
            bootstrapped: false,
        });
    }

    let mut delta = String::new();
    for record in &new_records {
        push_row(&mut delta, record, key_index);
    }

    if dry_run {
        return Ok(UpdateOutcome {
            appended: new_records.len(),
            bootstrapped: false,
        });
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(path.as_std_path())
        .map_err(|err| persistence(path, err))?;
    file.write_all(delta.as_bytes())
        .map_err(|err| persistence(path, err))?;
    file.sync_all().map_err(|err| persistence(path, err))?;

    info!(matrix = %path, appended = new_records.len(), "appended new rows");
    Ok(UpdateOutcome {
        appended: new_records.len(),
        bootstrapped: false,
    })
}

/// Reads the primary keys of every data row. An existing file with no header
/// line, or with any line whose field count differs from the persisted
/// column count, is fatal. Never guesses around a malformed file.
pub fn load_existing_keys(
    path: &Utf8Path,
    key_index: usize,
    expected_columns: usize,
) -> Result<HashSet<String>, TrackerError> {
    let content =
        fs::read_to_string(path.as_std_path()).map_err(|err| persistence(path, err))?;
    let mut lines = content.lines().enumerate();
    let Some((_, header)) = lines.next() else {
        return Err(TrackerError::MalformedMatrix {
            path: path.to_string(),
            line: 1,
            found: 0,
            expected: expected_columns,
        });
    };
    let header_columns = header.split('\t').count();
    if header_columns != expected_columns {
        return Err(TrackerError::MalformedMatrix {
            path: path.to_string(),
            line: 1,
            found: header_columns,
            expected: expected_columns,
        });
    }
    let mut keys = HashSet::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != expected_columns {
            return Err(TrackerError::MalformedMatrix {
                path: path.to_string(),
                line: line_no + 1,
                found: fields.len(),
                expected: expected_columns,
            });
        }
        keys.insert(fields[key_index].to_string());
    }
    Ok(keys)
}

pub fn status(
    path: &Utf8Path,
    key_index: usize,
    expected_columns: usize,
) -> Result<MatrixStatus, TrackerError> {
    if !path.as_std_path().exists() {
        return Ok(MatrixStatus {
            path: path.to_string(),
            rows: 0,
            last_key: None,
        });
    }
    let content =
        fs::read_to_string(path.as_std_path()).map_err(|err| persistence(path, err))?;
    let mut lines = content.lines().enumerate();
    let Some((_, header)) = lines.next() else {
        return Err(TrackerError::MalformedMatrix {
            path: path.to_string(),
            line: 1,
            found: 0,
            expected: expected_columns,
        });
    };
    let header_columns = header.split('\t').count();
    if header_columns != expected_columns {
        return Err(TrackerError::MalformedMatrix {
            path: path.to_string(),
            line: 1,
            found: header_columns,
            expected: expected_columns,
        });
    }
    let mut rows = 0usize;
    let mut last_key = None;
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != expected_columns {
            return Err(TrackerError::MalformedMatrix {
                path: path.to_string(),
                line: line_no + 1,
                found: fields.len(),
                expected: expected_columns,
            });
        }
        rows += 1;
        last_key = Some(fields[key_index].to_string());
    }
    Ok(MatrixStatus {
        path: path.to_string(),
        rows,
        last_key,
    })
}

fn bootstrap(
    path: &Utf8Path,
    batch: &[MetadataRecord],
    field_names: &[String],
    key_index: usize,
    dry_run: bool,
) -> Result<UpdateOutcome, TrackerError> {
    if dry_run {
        return Ok(UpdateOutcome {
            appended: batch.len(),
            bootstrapped: true,
        });
    }

    let mut content = String::new();
    content.push_str(&field_names.join("\t"));
    content.push('\t');
    content.push_str(DERIVED_FIELD_NAME);
    content.push('\n');
    for record in batch {
        push_row(&mut content, record, key_index);
    }

    write_bytes_atomic(path, content.as_bytes())?;
    info!(matrix = %path, rows = batch.len(), "bootstrapped matrix");
    Ok(UpdateOutcome {
        appended: batch.len(),
        bootstrapped: true,
    })
}

fn push_row(buffer: &mut String, record: &MetadataRecord, key_index: usize) {
    buffer.push_str(&record.to_tsv_line());
    buffer.push('\t');
    // dedup_by_key already dropped records without a key field
    if let Some(key) = record.key(key_index) {
        buffer.push_str(&derive_download_url(key));
    }
    buffer.push('\n');
}

fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), TrackerError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.as_std_path(),
        _ => std::path::Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| persistence(path, err))?;
    let mut temp = tempfile::Builder::new()
        .prefix("asm-track-matrix")
        .tempfile_in(parent)
        .map_err(|err| persistence(path, err))?;
    temp.write_all(content).map_err(|err| persistence(path, err))?;
    temp.persist(path.as_std_path()).map_err(|err| TrackerError::Persistence {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    Ok(())
}

fn persistence(path: &Utf8Path, err: std::io::Error) -> TrackerError {
    TrackerError::Persistence {
        path: path.to_string(),
        message: err.to_string(),
    }
}
