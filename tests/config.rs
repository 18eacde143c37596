use assert_matches::assert_matches;

use assembly_tracker::config::{ConfigLoader, DEFAULT_KEY_FIELD_INDEX, default_fields};
use assembly_tracker::error::TrackerError;

#[test]
fn resolve_reads_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("asm-track.json");
    std::fs::write(
        &path,
        r#"{
            "taxon_id": "2759",
            "project_accession": "PRJNA813333",
            "matrix_path": "eukaryote-matrix.tsv"
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(resolved.taxon_id.as_str(), "2759");
    assert_eq!(resolved.project_accession, "PRJNA813333");
    assert_eq!(resolved.fields, default_fields());
    assert_eq!(resolved.matrix_path.as_str(), "eukaryote-matrix.tsv");
    assert_eq!(resolved.key_field_index, DEFAULT_KEY_FIELD_INDEX);
}

#[test]
fn resolve_rejects_invalid_json() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("asm-track.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, TrackerError::ConfigParse(_));
}

#[test]
fn resolve_explicit_path_must_exist() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("missing.json");

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, TrackerError::ConfigRead(_));
}

#[test]
fn resolve_rejects_non_numeric_taxon() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("asm-track.json");
    std::fs::write(
        &path,
        r#"{ "taxon_id": "eukaryota", "project_accession": "PRJNA813333" }"#,
    )
    .unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, TrackerError::InvalidTaxonId(_));
}
