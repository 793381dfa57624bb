//! Configuration module for gitbom-cve.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Configuration File
//!
//! Place a `.gitbom-cve.yaml` file in your project root or `~/.config/gitbom-cve/`:
//!
//! ```yaml
//! databases:
//!   cve_db: ./cve_db.json
//!   bom_dir: ./.gitbom
//! behavior:
//!   fail_on_cve: true
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    debug_suffix, BOMSH_METADATA_DIR, DEFAULT_METADATA_DB_NAME, DEFAULT_RESULT_FILE_NAME,
    RECORDED_MAPPING_NAME,
};
pub use types::{
    AppConfig, AppConfigBuilder, BehaviorConfig, DatabaseConfig, OutputConfig, SearchConfig,
    SearchQuery,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.gitbom-cve.yaml` config files. It can be used by editors for
/// validation and autocompletion.
pub fn generate_json_schema() -> crate::error::Result<String> {
    let schema = schemars::schema_for!(AppConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}
