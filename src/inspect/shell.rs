//! [`ArtifactInspector`] backed by `git`, `file`, `ar`, `jar` and `readelf`.

use super::{ArtifactInspector, FileKind};
use crate::error::{CveSearchError, Result};
use crate::model::reference::is_checksum;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

/// Name of the archive member / ELF section carrying the bom id.
const BOM_ENTRY: &str = ".bom";

/// Inspector that shells out to standard tools.
///
/// Archive members are extracted into a scratch directory created under
/// `work_dir` and removed afterwards.
#[derive(Debug, Clone)]
pub struct ShellInspector {
    work_dir: PathBuf,
}

impl ShellInspector {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Extract the `.bom` member of an archive with `tool` and hex-encode it.
    fn extract_bom_member(&self, tool: &str, flag: &str, path: &Path) -> Option<String> {
        let absolute = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!("Cannot resolve {}: {e}", path.display());
                return None;
            }
        };
        let scratch = match tempfile::Builder::new()
            .prefix("gitbom-extract-")
            .tempdir_in(&self.work_dir)
        {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(
                    "Cannot create scratch directory in {}: {e}",
                    self.work_dir.display()
                );
                return None;
            }
        };

        let status = Command::new(tool)
            .arg(flag)
            .arg(&absolute)
            .arg(BOM_ENTRY)
            .current_dir(scratch.path())
            .output();
        if let Err(e) = status {
            tracing::debug!("`{tool} {flag}` unavailable: {e}");
            return None;
        }

        let bytes = std::fs::read(scratch.path().join(BOM_ENTRY)).ok()?;
        Some(hex::encode(bytes))
    }

    fn read_elf_section(&self, path: &Path) -> Option<String> {
        let output = Command::new("readelf")
            .args(["-x", BOM_ENTRY])
            .arg(path)
            .output();
        match output {
            Ok(out) => parse_readelf_bom_section(&String::from_utf8_lossy(&out.stdout)),
            Err(e) => {
                tracing::debug!("`readelf` unavailable: {e}");
                None
            }
        }
    }
}

impl ArtifactInspector for ShellInspector {
    fn checksum(&self, path: &Path) -> Result<String> {
        const COMMAND: &str = "git hash-object";
        let output = Command::new("git")
            .arg("hash-object")
            .arg(path)
            .output()
            .map_err(|e| CveSearchError::command_failed(COMMAND, e.to_string()))?;
        let stdout = successful_stdout(COMMAND, &output)?;
        let checksum = stdout.trim();
        if !is_checksum(checksum) {
            return Err(CveSearchError::unexpected_output(COMMAND, checksum));
        }
        Ok(checksum.to_string())
    }

    fn classify(&self, path: &Path) -> FileKind {
        match Command::new("file").arg(path).output() {
            Ok(out) => classify_description(&parse_file_description(&String::from_utf8_lossy(
                &out.stdout,
            ))),
            Err(e) => {
                tracing::debug!("`file` unavailable, assuming ELF: {e}");
                FileKind::Other
            }
        }
    }

    fn embedded_bom_id(&self, path: &Path, kind: FileKind) -> Option<String> {
        let id = match kind {
            FileKind::Archive => self.extract_bom_member("ar", "x", path),
            FileKind::JavaArchive => self.extract_bom_member("jar", "xf", path),
            FileKind::Other => self.read_elf_section(path),
        };
        id.filter(|id| !id.is_empty())
    }
}

fn successful_stdout(command: &str, output: &Output) -> Result<String> {
    if !output.status.success() {
        return Err(CveSearchError::command_failed(
            command,
            String::from_utf8_lossy(&output.stderr).trim(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Strip the `<path>:` prefix from `file` output.
///
/// Returns `"empty"` when the output carries no description.
pub fn parse_file_description(output: &str) -> String {
    static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();
    let parts: Vec<&str> = match SEPARATOR.get_or_init(|| Regex::new(r":\s+").ok()) {
        Some(separator) => separator.split(output.trim()).collect(),
        None => output.trim().split(": ").collect(),
    };
    if parts.len() > 1 {
        parts[1..].join(": ")
    } else {
        "empty".to_string()
    }
}

/// Map a `file` description to a [`FileKind`].
pub fn classify_description(description: &str) -> FileKind {
    if description == "current ar archive" {
        FileKind::Archive
    } else if description.contains(" archive data") {
        FileKind::JavaArchive
    } else {
        FileKind::Other
    }
}

/// Reassemble the 20-byte bom id from a `readelf -x .bom` hex dump.
///
/// The id spans the four words of the first row and the first word of the
/// second row.
pub fn parse_readelf_bom_section(output: &str) -> Option<String> {
    let lines: Vec<&str> = output.lines().collect();
    if lines.len() < 3 {
        return None;
    }
    let mut words: Vec<&str> = Vec::with_capacity(5);
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() > 5 && tokens[0] == "0x00000000" {
            words.extend_from_slice(&tokens[1..5]);
        } else if tokens.len() > 2 && tokens[0] == "0x00000010" {
            words.push(tokens[1]);
            break;
        }
    }
    let id = words.concat();
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const READELF_OUTPUT: &str = "
Hex dump of section '.bom':
  0x00000000 4b2a3c1d 5e6f7081 92a3b4c5 d6e7f809 K*<.^o..........
  0x00000010 1a2b3c4d                            .+<M
";

    #[test]
    fn test_parse_readelf_bom_section() {
        assert_eq!(
            parse_readelf_bom_section(READELF_OUTPUT).as_deref(),
            Some("4b2a3c1d5e6f708192a3b4c5d6e7f8091a2b3c4d")
        );
    }

    #[test]
    fn test_parse_readelf_without_section() {
        let output = "readelf: Warning: Section '.bom' was not dumped because it does not exist!\n";
        assert_eq!(parse_readelf_bom_section(output), None);
        assert_eq!(parse_readelf_bom_section(""), None);
    }

    #[test]
    fn test_parse_file_description() {
        assert_eq!(
            parse_file_description("/out/libfoo.a: current ar archive\n"),
            "current ar archive"
        );
        assert_eq!(
            parse_file_description("app.jar: Java archive data (JAR)"),
            "Java archive data (JAR)"
        );
        assert_eq!(parse_file_description("garbage"), "empty");
    }

    #[test]
    fn test_classify_description() {
        assert_eq!(classify_description("current ar archive"), FileKind::Archive);
        assert_eq!(
            classify_description("Java archive data (JAR)"),
            FileKind::JavaArchive
        );
        assert_eq!(
            classify_description("ELF 64-bit LSB executable, x86-64"),
            FileKind::Other
        );
    }

    #[test]
    fn test_embedded_id_missing_for_plain_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, "no bom here").unwrap();
        let inspector = ShellInspector::new(tmp.path());
        assert_eq!(inspector.embedded_bom_id(&file, FileKind::Other), None);
    }
}
