//! Configuration types for gitbom-cve searches.
//!
//! [`AppConfig`] is the persistent, file-backed part of the configuration.
//! [`SearchConfig`] is the fully resolved configuration of one run: the file
//! settings merged with CLI flags, plus the query itself.

use super::defaults::{
    BOMSH_METADATA_DIR, DEFAULT_METADATA_DB_NAME, DEFAULT_RESULT_FILE_NAME, RECORDED_MAPPING_NAME,
};
use crate::graph::DocumentMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Database locations
    pub databases: DatabaseConfig,
    /// Output configuration (result file, quiet)
    pub output: OutputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
    /// Scratch directory for extraction and the default result file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the CVE database file.
    pub fn cve_db(mut self, path: Option<PathBuf>) -> Self {
        self.config.databases.cve_db = path;
        self
    }

    /// Set the metadata database file.
    pub fn metadata_db(mut self, path: Option<PathBuf>) -> Self {
        self.config.databases.metadata_db = path;
        self
    }

    /// Set the raw checksum database file.
    pub fn raw_checksums(mut self, path: Option<PathBuf>) -> Self {
        self.config.databases.raw_checksums = path;
        self
    }

    /// Set the gitBOM repository directory.
    pub fn bom_dir(mut self, path: Option<PathBuf>) -> Self {
        self.config.databases.bom_dir = path;
        self
    }

    /// Set the result file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.output.quiet = quiet;
        self
    }

    /// Exit with a distinct code when CVEs are found.
    pub const fn fail_on_cve(mut self, fail: bool) -> Self {
        self.config.behavior.fail_on_cve = fail;
        self
    }

    /// Set how gitBOM documents become adjacency entries.
    pub const fn document_mode(mut self, mode: Option<DocumentMode>) -> Self {
        self.config.behavior.document_mode = mode;
        self
    }

    /// Set the work directory.
    pub fn work_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.work_dir = dir;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Database locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DatabaseConfig {
    /// CVE database (blob checksum → CVE lists)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve_db: Option<PathBuf>,
    /// Build metadata database (checksum → file path, build command)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_db: Option<PathBuf>,
    /// Pre-built raw checksum database; takes precedence over `bom_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_checksums: Option<PathBuf>,
    /// gitBOM repository directory holding `objects/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bom_dir: Option<PathBuf>,
}

impl DatabaseConfig {
    /// Blob → bom mapping persisted by the build tracer.
    pub fn recorded_mapping_path(&self) -> Option<PathBuf> {
        self.bom_dir
            .as_ref()
            .map(|dir| dir.join(BOMSH_METADATA_DIR).join(RECORDED_MAPPING_NAME))
    }

    /// The metadata database to load: the explicit one, or the build
    /// tracer's tree database when it exists.
    pub fn effective_metadata_db(&self) -> Option<PathBuf> {
        if let Some(path) = &self.metadata_db {
            return Some(path.clone());
        }
        let default = self
            .bom_dir
            .as_ref()?
            .join(BOMSH_METADATA_DIR)
            .join(DEFAULT_METADATA_DB_NAME);
        default.exists().then_some(default)
    }
}

/// Output-related configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Result file (defaults to `gitbom_cve_search.json` in the work dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Suppress the result echo on stdout
    pub quiet: bool,
}

/// Behavior flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Exit with code 2 if any CVE is found
    pub fail_on_cve: bool,
    /// How gitBOM documents become adjacency entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_mode: Option<DocumentMode>,
}

// ============================================================================
// Per-run configuration
// ============================================================================

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// CVEs for files
    Files(Vec<PathBuf>),
    /// CVEs for blob checksums
    Checksums(Vec<String>),
    /// CVEs for gitBOM document ids
    BomIds(Vec<String>),
    /// Vulnerable blob checksums for CVE ids
    Cves(Vec<String>),
}

impl SearchQuery {
    pub fn len(&self) -> usize {
        match self {
            Self::Files(files) => files.len(),
            Self::Checksums(items) | Self::BomIds(items) | Self::Cves(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether answering the query needs the hash graph.
    pub const fn needs_graph(&self) -> bool {
        !matches!(self, Self::Cves(_))
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Files(_) => write!(f, "files"),
            Self::Checksums(_) => write!(f, "checksums"),
            Self::BomIds(_) => write!(f, "gitBOM ids"),
            Self::Cves(_) => write!(f, "CVEs"),
        }
    }
}

/// Fully resolved configuration of one search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Database locations
    pub databases: DatabaseConfig,
    /// The query, if one was given
    pub query: Option<SearchQuery>,
    /// Output settings
    pub output: OutputConfig,
    /// Exit with code 2 if any CVE is found
    pub fail_on_cve: bool,
    /// Document interpretation for object store scans
    pub document_mode: DocumentMode,
    /// Scratch directory
    pub work_dir: PathBuf,
    /// Verbosity level (number of `-v` flags)
    pub verbosity: u8,
}

impl SearchConfig {
    /// Resolve a search configuration from merged application settings.
    pub fn from_app_config(app: AppConfig, query: Option<SearchQuery>, verbosity: u8) -> Self {
        Self {
            databases: app.databases,
            query,
            output: app.output,
            fail_on_cve: app.behavior.fail_on_cve,
            document_mode: app.behavior.document_mode.unwrap_or_default(),
            work_dir: app.work_dir.unwrap_or_else(std::env::temp_dir),
            verbosity,
        }
    }

    /// Where the search result is written.
    pub fn result_file(&self) -> PathBuf {
        self.output
            .file
            .clone()
            .unwrap_or_else(|| self.work_dir.join(DEFAULT_RESULT_FILE_NAME))
    }

    /// Sibling debug file of the result file: `<result><suffix>`.
    pub fn debug_file(&self, suffix: &str) -> PathBuf {
        let mut name = self.result_file().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}
