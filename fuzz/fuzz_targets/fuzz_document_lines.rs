#![no_main]
use gitbom_cve::graph::document_lines;
use gitbom_cve::model::NodeRef;
use libfuzzer_sys::fuzz_target;

/// Fuzz gitBOM document splitting and reference line parsing.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for line in document_lines(s) {
            let node = NodeRef::parse(&line);
            let _ = (node.node_id(), node.is_composite(), node.to_string());
        }
    }
});
