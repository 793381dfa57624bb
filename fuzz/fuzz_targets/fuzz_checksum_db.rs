#![no_main]
use gitbom_cve::graph::{summarize, GraphDatabases, HashTreeBuilder};
use gitbom_cve::model::{ChecksumDatabase, CveDatabase};
use libfuzzer_sys::fuzz_target;

/// Fuzz hash tree expansion over untrusted raw checksum databases.
///
/// Arbitrary adjacency (self references, cycles, composite lines) must
/// always terminate.
fuzz_target!(|data: &[u8]| {
    let Ok(checksums) = serde_json::from_slice::<ChecksumDatabase>(data) else {
        return;
    };
    let roots: Vec<String> = checksums.keys().cloned().collect();
    let dbs = GraphDatabases::new(checksums, CveDatabase::new());
    let mut builder = HashTreeBuilder::new(&dbs);
    for (_, tree) in builder.expand_roots(&roots) {
        let _ = summarize(&tree);
    }
});
