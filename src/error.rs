//! Unified error types for gitbom-cve.
//!
//! Only start-up conditions (configuration, unreadable or malformed
//! databases) surface as errors. Per-item problems during a search are
//! reported in the result instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gitbom-cve operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CveSearchError {
    /// Errors loading or saving a JSON database
    #[error("Database error: {context}")]
    Database {
        context: String,
        #[source]
        source: DatabaseErrorKind,
    },

    /// Errors from the external artifact inspection tools
    #[error("Artifact inspection failed: {context}")]
    Inspect {
        context: String,
        #[source]
        source: InspectErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific database error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DatabaseErrorKind {
    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Database file not found: {0}")]
    NotFound(PathBuf),
}

/// Specific inspection error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum InspectErrorKind {
    #[error("Failed to run `{command}`: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for gitbom-cve operations
pub type Result<T> = std::result::Result<T, CveSearchError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl CveSearchError {
    /// Create a database error with context
    pub fn database(context: impl Into<String>, source: DatabaseErrorKind) -> Self {
        Self::Database {
            context: context.into(),
            source,
        }
    }

    /// Create a database error for a missing file
    pub fn database_not_found(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::database(
            format!("loading {}", path.display()),
            DatabaseErrorKind::NotFound(path),
        )
    }

    /// Create an inspection error for a command that could not run
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        let command = command.into();
        Self::Inspect {
            context: format!("running {command}"),
            source: InspectErrorKind::CommandFailed {
                command,
                message: message.into(),
            },
        }
    }

    /// Create an inspection error for output that could not be interpreted
    pub fn unexpected_output(command: impl Into<String>, output: impl Into<String>) -> Self {
        let command = command.into();
        Self::Inspect {
            context: format!("reading output of {command}"),
            source: InspectErrorKind::UnexpectedOutput {
                command,
                output: output.into(),
            },
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for CveSearchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for CveSearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::database(
            "JSON deserialization",
            DatabaseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain outermost first: `"outer: inner: base"`.
///
/// # Example
///
/// ```ignore
/// use gitbom_cve::error::ErrorContext;
///
/// fn load(path: &Path) -> Result<CveDatabase> {
///     let text = std::fs::read_to_string(path).context("reading CVE database")?;
///     serde_json::from_str(&text)
///         .with_context(|| format!("parsing {}", path.display()))
/// }
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<CveSearchError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: CveSearchError, new_ctx: &str) -> CveSearchError {
    match err {
        CveSearchError::Database {
            context: existing,
            source,
        } => CveSearchError::Database {
            context: chain_context(new_ctx, &existing),
            source,
        },
        CveSearchError::Inspect {
            context: existing,
            source,
        } => CveSearchError::Inspect {
            context: chain_context(new_ctx, &existing),
            source,
        },
        CveSearchError::Io {
            path,
            message,
            source,
        } => CveSearchError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        CveSearchError::Config(msg) => CveSearchError::Config(chain_context(new_ctx, &msg)),
        CveSearchError::Validation(msg) => {
            CveSearchError::Validation(chain_context(new_ctx, &msg))
        }
    }
}

/// Chain two context strings together.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| CveSearchError::Validation(context.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CveSearchError::database_not_found("/db/cve.json");
        let display = err.to_string();
        assert!(display.contains("/db/cve.json"), "{display}");

        let err = CveSearchError::command_failed("readelf", "not installed");
        assert!(err.to_string().contains("readelf"));
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CveSearchError::io("/path/to/cve.json", io_err);
        assert!(err.to_string().contains("/path/to/cve.json"));
    }

    #[test]
    fn test_json_error_converts_to_database_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CveSearchError = json_err.into();
        assert!(matches!(
            err,
            CveSearchError::Database {
                source: DatabaseErrorKind::InvalidJson(_),
                ..
            }
        ));
    }

    #[test]
    fn test_context_chaining_multiple_levels() {
        fn inner() -> Result<()> {
            Err(CveSearchError::database(
                "base",
                DatabaseErrorKind::InvalidJson("eof".to_string()),
            ))
        }

        fn outer() -> Result<()> {
            inner().context("middle layer").context("outer layer")
        }

        match outer() {
            Err(CveSearchError::Database { context, .. }) => {
                assert_eq!(context, "outer layer: middle layer: base");
            }
            other => panic!("Expected Database error, got {other:?}"),
        }
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let mut called = false;
        let ok_result: Result<i32> = Ok(42);
        let _ = ok_result.with_context(|| {
            called = true;
            "should not be called"
        });
        assert!(!called, "Closure should not be called for Ok result");

        let err_result: Result<i32> = Err(CveSearchError::validation("error"));
        let _ = err_result.with_context(|| {
            called = true;
            "should be called"
        });
        assert!(called, "Closure should be called for Err result");
    }

    #[test]
    fn test_option_context() {
        assert_eq!(Some(7).context_none("missing").unwrap(), 7);
        match None::<i32>.context_none("missing value") {
            Err(CveSearchError::Validation(msg)) => assert_eq!(msg, "missing value"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
