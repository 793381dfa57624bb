//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.

mod search;

pub use search::{execute_search, run_search};

// Re-export config types used by handlers
pub use crate::config::{SearchConfig, SearchQuery};
