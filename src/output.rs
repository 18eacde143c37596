use std::io::{self, Write};

use serde::Serialize;

use crate::pipeline::{StatusReport, SyncReport};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_sync(result: &SyncReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_status(result: &StatusReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub fn print_sync_summary(result: &SyncReport) {
    for line in sync_summary_lines(result) {
        println!("{line}");
    }
}

pub fn sync_summary_lines(result: &SyncReport) -> Vec<String> {
    let counts = format!(
        "{} taxon / {} project accessions, {} in common, {} after deduplication",
        result.taxon_accessions,
        result.project_accessions,
        result.intersection,
        result.deduplicated
    );
    let outcome = if result.dry_run {
        format!(
            "dry run: {} new row(s) would be appended to {}",
            result.appended, result.matrix_path
        )
    } else if result.bootstrapped {
        format!(
            "bootstrapped {} with {} row(s)",
            result.matrix_path, result.appended
        )
    } else if result.appended == 0 {
        format!("matrix {} is up to date (0 new rows)", result.matrix_path)
    } else {
        format!(
            "appended {} new row(s) to {}",
            result.appended, result.matrix_path
        )
    };
    vec![counts, outcome]
}
