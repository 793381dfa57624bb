//! Output handling for search results and debug dumps.
//!
//! All JSON written by the tool has sorted keys and 4-space indentation.

use crate::config::SearchConfig;
use crate::error::Result as SearchResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Target for output - either stdout or a file
#[derive(Debug, Clone)]
pub enum OutputTarget {
    /// Write to stdout
    Stdout,
    /// Write to a file
    File(PathBuf),
}

/// Write output to the target (stdout or file)
pub fn write_output(content: &str, target: &OutputTarget, quiet: bool) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            println!("{content}");
            Ok(())
        }
        OutputTarget::File(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            if !quiet {
                tracing::info!("Written {}", path.display());
            }
            Ok(())
        }
    }
}

/// Render a value as JSON with sorted keys and 4-space indentation.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> SearchResult<String> {
    // serde_json::Map keeps keys sorted
    let value = serde_json::to_value(value)?;
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write a value as sorted, indented JSON to a file.
pub fn save_json<T: Serialize + ?Sized>(path: PathBuf, value: &T, quiet: bool) -> Result<()> {
    let content =
        render_json(value).with_context(|| format!("Failed to serialize {}", path.display()))?;
    write_output(&content, &OutputTarget::File(path), quiet)
}

/// Write a debug dump next to the result file when verbose enough.
///
/// Returns whether the dump was written.
pub fn write_debug_dump<T: Serialize + ?Sized>(
    config: &SearchConfig,
    min_verbosity: u8,
    suffix: &str,
    value: &T,
) -> Result<bool> {
    if config.verbosity < min_verbosity {
        return Ok(false);
    }
    save_json(config.debug_file(suffix), value, config.output.quiet)?;
    Ok(true)
}
