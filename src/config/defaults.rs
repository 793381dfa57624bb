//! Default values and well-known file locations.

/// Result file name used when no explicit result file is configured.
pub const DEFAULT_RESULT_FILE_NAME: &str = "gitbom_cve_search.json";

/// Build tracer metadata directory inside a gitBOM repository.
pub const BOMSH_METADATA_DIR: &str = "metadata/bomsh";

/// Build tracer tree database, used as the metadata database by default.
pub const DEFAULT_METADATA_DB_NAME: &str = "bomsh_gitbom_treedb";

/// Persisted blob → bom mapping written by the build tracer.
pub const RECORDED_MAPPING_NAME: &str = "bomsh_gitbom_doc_mapping";

/// Suffixes of the debug dumps written next to the result file.
pub mod debug_suffix {
    /// Expanded hash trees (verbosity 2 and up)
    pub const DETAILS: &str = "-details.json";
    /// Adjacency database (verbosity 3 and up)
    pub const TREEDB: &str = "-treedb.json";
    /// Expansion memo cache (verbosity 3 and up)
    pub const CACHE: &str = "-cache.json";
}
