//! Database loading.
//!
//! Every database named by the configuration is loaded up front; a missing
//! or malformed file is fatal. The adjacency database comes from the raw
//! checksum file when one is configured, otherwise from the gitBOM object
//! store.

use crate::config::{SearchConfig, SearchQuery};
use crate::error::{CveSearchError, ErrorContext, OptionContext, Result};
use crate::graph::{ChecksumDbBuilder, GraphDatabases, ObjectStore};
use crate::inspect::ArtifactInspector;
use crate::model::{BlobBomTable, ChecksumDatabase, CveDatabase, MetadataDatabase};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load a JSON database file.
pub fn load_json_db<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(CveSearchError::database_not_found(path));
    }
    let file = File::open(path).map_err(|e| CveSearchError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("loading {}", path.display()))
}

/// Load the persisted blob → bom mapping if the file exists.
pub fn load_recorded_mappings(path: Option<&Path>) -> Result<BlobBomTable> {
    match path {
        Some(path) if path.exists() => {
            let table: BlobBomTable = load_json_db(path)?;
            tracing::debug!(
                "Loaded {} recorded gitBOM mappings from {}",
                table.len(),
                path.display()
            );
            Ok(table)
        }
        _ => Ok(BlobBomTable::new()),
    }
}

/// Load or build every database one search run needs.
pub fn load_databases(
    config: &SearchConfig,
    inspector: &dyn ArtifactInspector,
) -> Result<GraphDatabases> {
    let databases = &config.databases;
    let cve_path = databases
        .cve_db
        .as_deref()
        .context_none("CVE database file is required")?;
    let cves: CveDatabase = load_json_db(cve_path)?;
    tracing::info!("Loaded {} CVE database entries", cves.len());

    let mut graph = GraphDatabases::new(load_checksum_db(config, inspector)?, cves);
    if let Some(path) = databases.effective_metadata_db() {
        let metadata: MetadataDatabase = load_json_db(&path)?;
        tracing::info!("Loaded {} metadata database entries", metadata.len());
        graph = graph.with_metadata(metadata);
    }
    Ok(graph)
}

/// The adjacency database for this run.
///
/// File queries against an object store only index the documents reachable
/// from those files. Reverse CVE queries need no graph at all.
pub fn load_checksum_db(
    config: &SearchConfig,
    inspector: &dyn ArtifactInspector,
) -> Result<ChecksumDatabase> {
    let databases = &config.databases;
    if let Some(path) = &databases.raw_checksums {
        let db: ChecksumDatabase = load_json_db(path)?;
        tracing::info!("Loaded {} raw checksum database entries", db.len());
        return Ok(db);
    }

    let Some(bom_dir) = &databases.bom_dir else {
        return Err(CveSearchError::config(
            "either a raw checksum database or a gitBOM directory is required",
        ));
    };
    if !config.query.as_ref().map_or(true, SearchQuery::needs_graph) {
        return Ok(ChecksumDatabase::new());
    }

    let mut builder = ChecksumDbBuilder::new(ObjectStore::in_bom_dir(bom_dir), config.document_mode);
    let db = match &config.query {
        Some(SearchQuery::Files(files)) => {
            let recorded = load_recorded_mappings(databases.recorded_mapping_path().as_deref())?;
            builder = builder.with_recorded_mappings(recorded);
            builder.scan_files(files, inspector)
        }
        _ => builder.scan_all(),
    };
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::DatabaseErrorKind;
    use crate::inspect::ShellInspector;
    use tempfile::TempDir;

    fn search_config(app: AppConfig, query: SearchQuery) -> SearchConfig {
        SearchConfig::from_app_config(app, Some(query), 0)
    }

    #[test]
    fn test_missing_database_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result: Result<CveDatabase> = load_json_db(&tmp.path().join("missing.json"));
        assert!(matches!(
            result,
            Err(CveSearchError::Database {
                source: DatabaseErrorKind::NotFound(_),
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_database_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cve.json");
        std::fs::write(&path, "{\"abc\": [1, 2").unwrap();
        let result: Result<CveDatabase> = load_json_db(&path);
        match result {
            Err(CveSearchError::Database { context, .. }) => {
                assert!(context.starts_with("loading "), "{context}");
            }
            other => panic!("Expected Database error, got {other:?}"),
        }
    }

    #[test]
    fn test_raw_checksum_db_takes_precedence() {
        let tmp = TempDir::new().unwrap();
        let raw = tmp.path().join("raw.json");
        std::fs::write(&raw, r#"{"bbbb": {"hash_tree": ["aaaa"]}}"#).unwrap();
        let app = AppConfig::builder()
            .raw_checksums(Some(raw))
            .bom_dir(Some(tmp.path().join("bom")))
            .build();
        let config = search_config(app, SearchQuery::Checksums(vec!["bbbb".to_string()]));

        let db = load_checksum_db(&config, &ShellInspector::new(tmp.path())).unwrap();
        assert_eq!(db["bbbb"].children(), ["aaaa"]);
    }

    #[test]
    fn test_missing_object_store_yields_empty_db() {
        let tmp = TempDir::new().unwrap();
        let app = AppConfig::builder()
            .bom_dir(Some(tmp.path().join("bom")))
            .build();
        let config = search_config(app, SearchQuery::BomIds(vec!["cccc".to_string()]));
        let db = load_checksum_db(&config, &ShellInspector::new(tmp.path())).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn test_recorded_mappings_optional() {
        let tmp = TempDir::new().unwrap();
        assert!(load_recorded_mappings(None).unwrap().is_empty());
        assert!(load_recorded_mappings(Some(tmp.path().join("none").as_path()))
            .unwrap()
            .is_empty());

        let path = tmp.path().join("mapping");
        std::fs::write(&path, r#"{"aaaa": "cccc"}"#).unwrap();
        assert_eq!(
            load_recorded_mappings(Some(path.as_path())).unwrap().get("aaaa"),
            Some("cccc")
        );
    }
}
