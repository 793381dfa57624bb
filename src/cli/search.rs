//! Search command handler.

use crate::config::{debug_suffix, SearchConfig, SearchQuery};
use crate::graph::GraphDatabases;
use crate::inspect::{ArtifactInspector, CachingInspector, ShellInspector};
use crate::pipeline::{
    exit_codes, load_databases, render_json, save_json, write_debug_dump, write_output,
    OutputTarget,
};
use crate::search::{checksums_for_cves, CveLookup, CveSearch, SearchResult};
use anyhow::{Context, Result};
use std::collections::BTreeMap;

/// Header printed before the result on stdout.
const RESULT_HEADER: &str = "Here is the CVE search results:";

/// Run the search command.
///
/// Assumes a validated configuration. Returns the process exit code.
pub fn run_search(config: SearchConfig) -> Result<i32> {
    let inspector = ShellInspector::new(config.work_dir());
    let result = execute_search(&config, &inspector)?;

    if result.is_empty() {
        tracing::info!("Nothing found; no result file written");
    } else {
        save_json(config.result_file(), &result, config.output.quiet)?;
    }

    if !config.output.quiet {
        println!("\n{RESULT_HEADER}");
        let rendered = render_json(&result).context("Failed to render search result")?;
        write_output(&rendered, &OutputTarget::Stdout, true)?;
    }

    if config.fail_on_cve && result.has_vulnerabilities() {
        return Ok(exit_codes::CVES_FOUND);
    }
    Ok(exit_codes::SUCCESS)
}

/// Load the databases and answer the configured query.
///
/// Writes the debug dumps the verbosity level asks for.
pub fn execute_search(
    config: &SearchConfig,
    inspector: &dyn ArtifactInspector,
) -> Result<SearchResult> {
    let query = config
        .query
        .as_ref()
        .context("No search query given")?;
    tracing::info!("Searching {} {query}", query.len());
    let caching = CachingInspector::new(inspector);
    let inspector: &dyn ArtifactInspector = &caching;

    let dbs = load_databases(config, inspector).context("Failed to load databases")?;
    write_debug_dump(config, 3, debug_suffix::TREEDB, &dbs.checksums)?;

    let result = match query {
        SearchQuery::Cves(cves) => SearchResult::Checksums(checksums_for_cves(cves, &dbs.cves)),
        SearchQuery::Files(files) => {
            search_graph(config, &dbs, |search| search.cves_for_files(files, inspector))?
        }
        SearchQuery::Checksums(checksums) => {
            search_graph(config, &dbs, |search| search.cves_for_checksums(checksums))?
        }
        SearchQuery::BomIds(bom_ids) => {
            search_graph(config, &dbs, |search| search.cves_for_bom_ids(bom_ids))?
        }
    };
    Ok(result)
}

/// Run one forward query over the hash graph.
fn search_graph<F>(config: &SearchConfig, dbs: &GraphDatabases, run: F) -> Result<SearchResult>
where
    F: for<'s> FnOnce(&mut CveSearch<'s, GraphDatabases>) -> BTreeMap<String, CveLookup>,
{
    let mut search = CveSearch::new(dbs);
    let lookups = run(&mut search);

    let stats = search.stats();
    tracing::debug!(
        "Expanded {} nodes ({} cache hits, {} cycles)",
        stats.nodes_built,
        stats.cache_hits,
        stats.cycles_detected
    );
    write_debug_dump(config, 2, debug_suffix::DETAILS, search.trees())?;
    write_debug_dump(config, 3, debug_suffix::CACHE, search.cache())?;
    Ok(SearchResult::Cves(lookups))
}
