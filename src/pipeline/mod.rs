//! Pipeline stages shared by the command handlers.
//!
//! Loading turns configured paths into in-memory databases; output renders
//! results and debug dumps.

mod load;
mod output;

pub use load::{load_checksum_db, load_databases, load_json_db, load_recorded_mappings};
pub use output::{render_json, save_json, write_debug_dump, write_output, OutputTarget};

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// CVEs were found (with --fail-on-cve)
    pub const CVES_FOUND: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}
