use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::domain::{AccessionId, MetadataRecord, TaxonId};
use crate::error::TrackerError;

/// Metadata field names the projection table understands.
pub const SUPPORTED_FIELDS: &[&str] = &[
    "organism-name",
    "tax-id",
    "accession",
    "assembly-level",
    "assembly-name",
    "release-date",
    "submitter",
    "total-sequence-length",
];

/// Upstream seam: accession listing and metadata retrieval.
pub trait DatasetsClient: Send + Sync {
    fn query_by_taxon(&self, taxon: &TaxonId) -> Result<Vec<AccessionId>, TrackerError>;
    fn query_by_accession(&self, accession: &str) -> Result<Vec<AccessionId>, TrackerError>;
    fn fetch_metadata(
        &self,
        accessions: &[AccessionId],
        fields: &[String],
    ) -> Result<Vec<MetadataRecord>, TrackerError>;
}

#[derive(Clone)]
pub struct DatasetsHttpClient {
    client: Client,
    base_url: String,
}

const PAGE_SIZE: u32 = 5000;
const METADATA_CHUNK: usize = 100;

impl DatasetsHttpClient {
    pub fn new() -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("asm-track/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| TrackerError::Filesystem(err.to_string()))?,
        );
        headers.insert("X-Datasets-Client", HeaderValue::from_static("asm-track"));
        headers.insert(
            "X-Datasets-Client-Version",
            HeaderValue::from_str(env!("CARGO_PKG_VERSION"))
                .map_err(|err| TrackerError::Filesystem(err.to_string()))?,
        );

        if let Ok(api_key) = std::env::var("NCBI_API_KEY") {
            if !api_key.trim().is_empty() {
                headers.insert(
                    "api-key",
                    HeaderValue::from_str(api_key.trim())
                        .map_err(|err| TrackerError::Filesystem(err.to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| TrackerError::DatasetsHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: "https://api.ncbi.nlm.nih.gov/datasets/v2".to_string(),
        })
    }

    fn fetch_reports(&self, url: &str) -> Result<Vec<Value>, TrackerError> {
        let response = self.send_with_retries(|| {
            self.client
                .get(url)
                .query(&[("page_size", PAGE_SIZE.to_string())])
        })?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "NCBI Datasets request failed".to_string());
            return Err(TrackerError::DatasetsStatus { status, message });
        }
        let payload: Value = response
            .json()
            .map_err(|err| TrackerError::DatasetsPayload(err.to_string()))?;
        match payload.get("reports") {
            None => Ok(Vec::new()),
            Some(Value::Array(reports)) => Ok(reports.clone()),
            Some(other) => Err(TrackerError::DatasetsPayload(format!(
                "reports is not an array: {other}"
            ))),
        }
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, TrackerError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(TrackerError::DatasetsHttp(err.to_string()));
                }
            }
        }
    }
}

impl DatasetsClient for DatasetsHttpClient {
    fn query_by_taxon(&self, taxon: &TaxonId) -> Result<Vec<AccessionId>, TrackerError> {
        let url = format!(
            "{}/genome/taxon/{}/dataset_report",
            self.base_url,
            taxon.as_str()
        );
        let reports = self.fetch_reports(&url)?;
        extract_accessions(&reports)
    }

    fn query_by_accession(&self, accession: &str) -> Result<Vec<AccessionId>, TrackerError> {
        let url = format!("{}/genome/accession/{}/dataset_report", self.base_url, accession);
        let reports = self.fetch_reports(&url)?;
        extract_accessions(&reports)
    }

    fn fetch_metadata(
        &self,
        accessions: &[AccessionId],
        fields: &[String],
    ) -> Result<Vec<MetadataRecord>, TrackerError> {
        let mut records = Vec::with_capacity(accessions.len());
        for chunk in accessions.chunks(METADATA_CHUNK) {
            let joined = chunk
                .iter()
                .map(AccessionId::as_str)
                .collect::<Vec<_>>()
                .join(",");
            let url = format!("{}/genome/accession/{}/dataset_report", self.base_url, joined);
            for report in self.fetch_reports(&url)? {
                records.push(project_record(&report, fields)?);
            }
        }
        Ok(records)
    }
}

fn extract_accessions(reports: &[Value]) -> Result<Vec<AccessionId>, TrackerError> {
    reports
        .iter()
        .map(|report| {
            report
                .get("accession")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    TrackerError::DatasetsPayload("report without accession".to_string())
                })?
                .parse()
        })
        .collect()
}

/// Projects one dataset report onto the configured field names, in order.
/// Values absent from the report become empty strings.
fn project_record(report: &Value, fields: &[String]) -> Result<MetadataRecord, TrackerError> {
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        let value = match field.as_str() {
            "accession" => lookup(report, &["accession"]),
            "organism-name" => lookup(report, &["organism", "organism_name"]),
            "tax-id" => lookup(report, &["organism", "tax_id"]),
            "assembly-level" => lookup(report, &["assembly_info", "assembly_level"]),
            "assembly-name" => lookup(report, &["assembly_info", "assembly_name"]),
            "release-date" => lookup(report, &["assembly_info", "release_date"]),
            "submitter" => lookup(report, &["assembly_info", "submitter"]),
            "total-sequence-length" => lookup(report, &["assembly_stats", "total_sequence_length"]),
            other => return Err(TrackerError::UnknownField(other.to_string())),
        };
        values.push(value);
    }
    Ok(MetadataRecord::new(values))
}

fn lookup(report: &Value, path: &[&str]) -> String {
    let mut node = report;
    for segment in path {
        match node.get(segment) {
            Some(next) => node = next,
            None => return String::new(),
        }
    }
    match node {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
