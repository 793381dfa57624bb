//! Configuration validation for gitbom-cve.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, DatabaseConfig, OutputConfig, SearchConfig};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.output.validate());
        if let Some(dir) = &self.work_dir {
            if !dir.is_dir() {
                errors.push(ConfigError::new(
                    "work_dir",
                    format!("Directory does not exist: {}", dir.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(parent) = self.file.as_deref().and_then(std::path::Path::parent) {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                errors.push(ConfigError::new(
                    "output.file",
                    format!("Parent directory does not exist: {}", parent.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for DatabaseConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.cve_db.is_none() {
            errors.push(ConfigError::new(
                "databases.cve_db",
                "Please specify the CVE database file with -d option",
            ));
        }
        if self.raw_checksums.is_none() && self.bom_dir.is_none() {
            errors.push(ConfigError::new(
                "databases.raw_checksums",
                "Please specify the raw checksum database file with -r option \
                 or the gitBOM directory with -b option",
            ));
        }
        errors
    }
}

impl Validatable for SearchConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.databases.validate();
        errors.extend(self.output.validate());
        match &self.query {
            None => errors.push(ConfigError::new(
                "query",
                "Nothing to search for. Try the -c, -f, -g or -e option",
            )),
            Some(query) if query.is_empty() => errors.push(ConfigError::new(
                "query",
                format!("The list of {query} to search is empty"),
            )),
            Some(_) => {}
        }
        if !self.work_dir.is_dir() {
            errors.push(ConfigError::new(
                "work_dir",
                format!("Directory does not exist: {}", self.work_dir.display()),
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchQuery;
    use tempfile::TempDir;

    fn valid_search(work_dir: &std::path::Path) -> SearchConfig {
        let app = AppConfig::builder()
            .cve_db(Some("cve.json".into()))
            .bom_dir(Some("bom".into()))
            .work_dir(Some(work_dir.to_path_buf()))
            .build();
        SearchConfig::from_app_config(
            app,
            Some(SearchQuery::Checksums(vec!["abc".to_string()])),
            0,
        )
    }

    #[test]
    fn test_valid_search_config() {
        let tmp = TempDir::new().unwrap();
        assert!(valid_search(tmp.path()).is_valid());
    }

    #[test]
    fn test_missing_databases() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid_search(tmp.path());
        config.databases = DatabaseConfig::default();
        let fields: Vec<_> = config.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, ["databases.cve_db", "databases.raw_checksums"]);
    }

    #[test]
    fn test_raw_checksums_alone_is_enough() {
        let databases = DatabaseConfig {
            cve_db: Some("cve.json".into()),
            raw_checksums: Some("raw.json".into()),
            ..DatabaseConfig::default()
        };
        assert!(databases.is_valid());
    }

    #[test]
    fn test_missing_or_empty_query() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid_search(tmp.path());
        config.query = None;
        assert_eq!(config.validate()[0].field, "query");

        config.query = Some(SearchQuery::Files(Vec::new()));
        assert!(config.validate()[0].message.contains("files"));
    }

    #[test]
    fn test_output_parent_must_exist() {
        let output = OutputConfig {
            file: Some("/nonexistent/dir/result.json".into()),
            quiet: false,
        };
        assert!(!output.is_valid());
        assert!(OutputConfig::default().is_valid());
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::new("databases.cve_db", "missing");
        assert_eq!(error.to_string(), "databases.cve_db: missing");
    }

    #[test]
    fn test_app_config_validation() {
        assert!(AppConfig::default().is_valid());
        let invalid = AppConfig::builder()
            .work_dir(Some("/nonexistent/work".into()))
            .build();
        assert!(!invalid.is_valid());
    }
}
