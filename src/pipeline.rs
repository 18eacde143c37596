use serde::Serialize;
use tracing::{info, warn};

use crate::config::ResolvedConfig;
use crate::datasets::DatasetsClient;
use crate::error::TrackerError;
use crate::matrix;
use crate::setops::{dedup_by_key, intersect};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub taxon_accessions: usize,
    pub project_accessions: usize,
    pub intersection: usize,
    pub deduplicated: usize,
    pub appended: usize,
    pub bootstrapped: bool,
    pub dry_run: bool,
    pub matrix_path: String,
    pub finished_at: String,
}

pub struct SyncRunner<C: DatasetsClient> {
    client: C,
}

impl<C: DatasetsClient> SyncRunner<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Runs the full pipeline: two accession queries, intersection, metadata
    /// retrieval, deduplication, matrix merge. Any upstream or persistence
    /// failure aborts before the matrix is touched or after it is fully
    /// updated, never in between.
    pub fn run(
        &self,
        config: &ResolvedConfig,
        options: &SyncOptions,
    ) -> Result<SyncReport, TrackerError> {
        info!(taxon = %config.taxon_id, "querying assemblies by taxon");
        let by_taxon = self.client.query_by_taxon(&config.taxon_id)?;
        info!(count = by_taxon.len(), "taxon query returned");

        info!(project = %config.project_accession, "querying assemblies by project");
        let by_project = self.client.query_by_accession(&config.project_accession)?;
        info!(count = by_project.len(), "project query returned");

        let common = intersect(&by_taxon, &by_project);
        if common.is_empty() {
            warn!(
                taxon = %config.taxon_id,
                project = %config.project_accession,
                "no common accessions between taxon and project"
            );
        }

        let records = if common.is_empty() {
            Vec::new()
        } else {
            info!(count = common.len(), "fetching metadata for intersection");
            self.client.fetch_metadata(&common, &config.fields)?
        };

        let deduplicated = dedup_by_key(records, config.key_field_index);
        let outcome = matrix::update(
            &config.matrix_path,
            &deduplicated,
            &config.fields,
            config.key_field_index,
            options.dry_run,
        )?;

        let report = SyncReport {
            taxon_accessions: by_taxon.len(),
            project_accessions: by_project.len(),
            intersection: common.len(),
            deduplicated: deduplicated.len(),
            appended: outcome.appended,
            bootstrapped: outcome.bootstrapped,
            dry_run: options.dry_run,
            matrix_path: config.matrix_path.to_string(),
            finished_at: chrono::Utc::now().to_rfc3339(),
        };
        info!(
            appended = report.appended,
            dry_run = report.dry_run,
            "sync finished"
        );
        Ok(report)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub matrix_path: String,
    pub rows: usize,
    pub last_key: Option<String>,
}

pub fn status(config: &ResolvedConfig) -> Result<StatusReport, TrackerError> {
    let status = matrix::status(
        &config.matrix_path,
        config.key_field_index,
        config.fields.len() + 1,
    )?;
    Ok(StatusReport {
        matrix_path: status.path,
        rows: status.rows,
        last_key: status.last_key,
    })
}
