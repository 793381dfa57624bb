//! Performance benchmarks for hash tree expansion and CVE aggregation.
//!
//! Run with: cargo bench --bench hash_tree
//!
//! The generated graphs are layered diamonds: every node links to two nodes
//! of the next layer, so subtrees are heavily shared and the memo cache does
//! most of the work.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gitbom_cve::graph::{GraphDatabases, HashTreeBuilder, summarize};
use gitbom_cve::model::{ChecksumDatabase, ChecksumNode, CveDatabase, CveRecord};
use gitbom_cve::search::CveSearch;
use std::hint::black_box;

fn node_id(layer: usize, index: usize) -> String {
    format!("{layer:08x}{index:032x}")
}

/// Build `layers` layers of `width` nodes; the last layer holds the leaves.
fn layered_graph(layers: usize, width: usize) -> GraphDatabases {
    let mut checksums = ChecksumDatabase::new();
    let mut cves = CveDatabase::new();

    for layer in 0..layers {
        for index in 0..width {
            let id = node_id(layer, index);
            if layer + 1 < layers {
                let children = vec![
                    node_id(layer + 1, index),
                    node_id(layer + 1, (index + 1) % width),
                ];
                checksums.insert(id, ChecksumNode::with_children(children));
            } else if index % 7 == 0 {
                cves.insert(id, CveRecord::vulnerable([format!("CVE-2024-{index}")]));
            }
        }
    }

    GraphDatabases::new(checksums, cves)
}

fn bench_expand_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_cold");

    for &(layers, width) in &[(5, 20), (10, 50), (20, 100)] {
        let dbs = layered_graph(layers, width);
        let root = node_id(0, 0);
        group.bench_with_input(
            BenchmarkId::new("layers_x_width", format!("{layers}x{width}")),
            &(dbs, root),
            |b, (dbs, root)| {
                b.iter(|| {
                    let mut builder = HashTreeBuilder::new(dbs);
                    black_box(builder.expand(black_box(root)))
                })
            },
        );
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for &(layers, width) in &[(10, 50), (20, 100)] {
        let dbs = layered_graph(layers, width);
        let mut builder = HashTreeBuilder::new(&dbs);
        let tree = builder.expand(&node_id(0, 0));
        group.bench_with_input(
            BenchmarkId::new("summarize", format!("{layers}x{width}")),
            &tree,
            |b, tree| b.iter(|| black_box(summarize(black_box(tree)))),
        );
    }

    group.finish();
}

fn bench_search_all_roots(c: &mut Criterion) {
    let dbs = layered_graph(20, 100);
    let roots: Vec<String> = (0..100).map(|index| node_id(0, index)).collect();

    c.bench_function("search_all_roots_20x100", |b| {
        b.iter(|| {
            let mut search = CveSearch::new(&dbs);
            black_box(search.cves_for_checksums(black_box(&roots)))
        })
    });
}

criterion_group!(
    benches,
    bench_expand_cold,
    bench_aggregate,
    bench_search_all_roots,
);

criterion_main!(benches);
