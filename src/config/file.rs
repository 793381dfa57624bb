//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".gitbom-cve.yaml",
    ".gitbom-cve.yml",
    "gitbom-cve.yaml",
    "gitbom-cve.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/gitbom-cve/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().ok();
    if let Some(path) = cwd.as_deref().and_then(find_config_in_dir) {
        return Some(path);
    }

    if let Some(path) = find_git_root().as_deref().and_then(find_config_in_dir) {
        return Some(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        if let Some(path) = find_config_in_dir(&config_dir.join("gitbom-cve")) {
            return Some(path);
        }
    }

    dirs::home_dir().as_deref().and_then(find_config_in_dir)
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug)]
pub enum ConfigFileError {
    /// File not found
    NotFound(PathBuf),
    /// IO error reading file
    Io(std::io::Error),
    /// YAML parsing error
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            Self::Io(e) => write!(f, "Failed to read config file: {e}"),
            Self::Parse(e) => write!(f, "Failed to parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigFileError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err)
    }
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// This is useful for layering CLI args over file config.
    pub fn merge(&mut self, other: &Self) {
        let databases = &other.databases;
        if databases.cve_db.is_some() {
            self.databases.cve_db.clone_from(&databases.cve_db);
        }
        if databases.metadata_db.is_some() {
            self.databases.metadata_db.clone_from(&databases.metadata_db);
        }
        if databases.raw_checksums.is_some() {
            self.databases.raw_checksums.clone_from(&databases.raw_checksums);
        }
        if databases.bom_dir.is_some() {
            self.databases.bom_dir.clone_from(&databases.bom_dir);
        }

        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.quiet {
            self.output.quiet = true;
        }

        if other.behavior.fail_on_cve {
            self.behavior.fail_on_cve = true;
        }
        if other.behavior.document_mode.is_some() {
            self.behavior.document_mode = other.behavior.document_mode;
        }

        if other.work_dir.is_some() {
            self.work_dir.clone_from(&other.work_dir);
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_example_config() -> String {
    r"# gitbom-cve Configuration File
# ==============================
#
# Place it at:
#   - .gitbom-cve.yaml in your project root
#   - ~/.config/gitbom-cve/gitbom-cve.yaml for global config
#
# CLI arguments always override file settings.

databases:
  # CVE database: blob checksum -> CVElist / FixedCVElist
  # cve_db: ./cve_db.json
  # Build metadata database: checksum -> file_path / build_cmd
  # metadata_db: ./metadata_db.json
  # Pre-built raw checksum database (takes precedence over bom_dir)
  # raw_checksums: ./bomsh_hook_raw_checksums.json
  # gitBOM repository directory containing objects/
  # bom_dir: ./.gitbom

output:
  # Result file (default: <work_dir>/gitbom_cve_search.json)
  # file: ./cve_result.json
  # Do not echo the result on stdout
  quiet: false

behavior:
  # Exit with code 2 if any CVE is found
  fail_on_cve: false
  # checksum-line (keep full document lines) or bom-id
  document_mode: checksum-line

# Scratch directory (default: system temp dir)
# work_dir: /tmp
"
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DocumentMode;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".gitbom-cve.yaml");
        std::fs::write(&config_path, "output:\n  quiet: true\n").unwrap();

        let found = find_config_in_dir(tmp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");
        let yaml = r"
databases:
  cve_db: /data/cve_db.json
  bom_dir: /data/.gitbom
behavior:
  fail_on_cve: true
  document_mode: bom-id
";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(
            config.databases.cve_db,
            Some(PathBuf::from("/data/cve_db.json"))
        );
        assert!(config.behavior.fail_on_cve);
        assert_eq!(config.behavior.document_mode, Some(DocumentMode::BomId));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_config_merge_cli_wins() {
        let mut base = AppConfig::builder()
            .cve_db(Some("file_cve.json".into()))
            .bom_dir(Some("/bom".into()))
            .build();
        let cli = AppConfig::builder()
            .cve_db(Some("cli_cve.json".into()))
            .fail_on_cve(true)
            .build();

        base.merge(&cli);

        assert_eq!(base.databases.cve_db, Some(PathBuf::from("cli_cve.json")));
        assert_eq!(base.databases.bom_dir, Some(PathBuf::from("/bom")));
        assert!(base.behavior.fail_on_cve);
    }

    #[test]
    fn test_example_config_parses() {
        let example = generate_example_config();
        let config: AppConfig = serde_yaml::from_str(&example).unwrap();
        assert_eq!(
            config.behavior.document_mode,
            Some(DocumentMode::ChecksumLine)
        );
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        std::fs::write(&config_path, "output:\n  quiet: true\n").unwrap();

        assert_eq!(discover_config_file(Some(&config_path)), Some(config_path));
    }
}
