use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::datasets::SUPPORTED_FIELDS;
use crate::domain::TaxonId;
use crate::error::TrackerError;

pub const DEFAULT_CONFIG_FILE: &str = "asm-track.json";
pub const DEFAULT_MATRIX_FILE: &str = "assembly-matrix.tsv";
pub const DEFAULT_KEY_FIELD_INDEX: usize = 2;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub taxon_id: String,
    pub project_accession: String,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub matrix_path: Option<String>,
    #[serde(default)]
    pub key_field_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub taxon_id: TaxonId,
    pub project_accession: String,
    pub fields: Vec<String>,
    pub matrix_path: Utf8PathBuf,
    pub key_field_index: usize,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, TrackerError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(TrackerError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| TrackerError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| TrackerError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, TrackerError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let taxon_id: TaxonId = config.taxon_id.parse()?;

        let project_accession = config.project_accession.trim().to_string();
        if project_accession.is_empty() {
            return Err(TrackerError::InvalidProjectAccession(
                config.project_accession,
            ));
        }

        let fields = config.fields.unwrap_or_else(default_fields);
        if fields.is_empty() {
            return Err(TrackerError::UnknownField("<empty field list>".to_string()));
        }
        for field in &fields {
            if !SUPPORTED_FIELDS.contains(&field.as_str()) {
                return Err(TrackerError::UnknownField(field.clone()));
            }
        }

        let key_field_index = config.key_field_index.unwrap_or(DEFAULT_KEY_FIELD_INDEX);
        if key_field_index >= fields.len() {
            return Err(TrackerError::KeyIndexOutOfBounds {
                index: key_field_index,
                count: fields.len(),
            });
        }
        if fields[key_field_index] != "accession" {
            return Err(TrackerError::KeyFieldMismatch {
                index: key_field_index,
                found: fields[key_field_index].clone(),
            });
        }

        let matrix_path = Utf8PathBuf::from(
            config
                .matrix_path
                .unwrap_or_else(|| DEFAULT_MATRIX_FILE.to_string()),
        );

        Ok(ResolvedConfig {
            schema_version,
            taxon_id,
            project_accession,
            fields,
            matrix_path,
            key_field_index,
        })
    }
}

pub fn default_fields() -> Vec<String> {
    vec![
        "organism-name".to_string(),
        "tax-id".to_string(),
        "accession".to_string(),
        "assembly-level".to_string(),
        "release-date".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn base_config() -> Config {
        Config {
            schema_version: None,
            taxon_id: "2759".to_string(),
            project_accession: "PRJNA813333".to_string(),
            fields: None,
            matrix_path: None,
            key_field_index: None,
        }
    }

    #[test]
    fn resolve_defaults() {
        let resolved = ConfigLoader::resolve_config(base_config()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.taxon_id.as_str(), "2759");
        assert_eq!(resolved.fields, default_fields());
        assert_eq!(resolved.matrix_path, Utf8PathBuf::from(DEFAULT_MATRIX_FILE));
        assert_eq!(resolved.key_field_index, DEFAULT_KEY_FIELD_INDEX);
    }

    #[test]
    fn resolve_rejects_unknown_field() {
        let mut config = base_config();
        config.fields = Some(vec!["accession".to_string(), "karyotype".to_string()]);
        config.key_field_index = Some(0);
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, TrackerError::UnknownField(field) if field == "karyotype");
    }

    #[test]
    fn resolve_rejects_out_of_bounds_key_index() {
        let mut config = base_config();
        config.fields = Some(vec!["accession".to_string()]);
        config.key_field_index = Some(3);
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, TrackerError::KeyIndexOutOfBounds { index: 3, count: 1 });
    }

    #[test]
    fn resolve_rejects_key_field_that_is_not_accession() {
        let mut config = base_config();
        config.key_field_index = Some(0);
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, TrackerError::KeyFieldMismatch { index: 0, .. });
    }
}
