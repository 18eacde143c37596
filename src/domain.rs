use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Assembly accession in the NCBI catalog, e.g. `GCA_000001405.29`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessionId(String);

impl AccessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccessionId {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid = normalized.starts_with("GCF_") || normalized.starts_with("GCA_");
        let parts = normalized.split('.').collect::<Vec<_>>();
        let has_numeric = parts
            .first()
            .map(|prefix| prefix.trim_start_matches("GCF_").trim_start_matches("GCA_"))
            .map(|rest| rest.chars().all(|ch| ch.is_ascii_digit()) && !rest.is_empty())
            .unwrap_or(false);
        if !is_valid || !has_numeric {
            return Err(TrackerError::InvalidAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// NCBI taxonomy id, numeric string (e.g. `2759` for Eukaryota).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonId(String);

impl TaxonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonId {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        if normalized.is_empty() || !normalized.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(TrackerError::InvalidTaxonId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// One row of upstream metadata, fields in the configured order.
///
/// Construction normalizes embedded tabs and newlines to single spaces so the
/// matrix TSV framing holds for every record that reaches persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    fields: Vec<String>,
}

impl MetadataRecord {
    pub fn new(fields: Vec<String>) -> Self {
        let fields = fields
            .into_iter()
            .map(|field| {
                field
                    .trim()
                    .chars()
                    .map(|ch| if ch == '\t' || ch == '\n' || ch == '\r' { ' ' } else { ch })
                    .collect()
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn key(&self, key_index: usize) -> Option<&str> {
        self.fields.get(key_index).map(String::as_str)
    }

    pub fn to_tsv_line(&self) -> String {
        self.fields.join("\t")
    }
}
