//! Benchmarks for dual-graph construction and the Steiner solver.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kwgraph::graph::dual::{DualGraph, DualNode};
use kwgraph::graph::steiner;
use kwgraph::graph::{EdgeKind, Node, OntologyGraph};
use kwgraph::vocab::MemoryVocabulary;

/// A `width` x `depth` lattice of classes: each node links to the next
/// layer's node in the same and the following column.
fn lattice(width: usize, depth: usize) -> OntologyGraph {
    let id = |layer: usize, col: usize| format!("n{layer}_{col}");
    let mut g = OntologyGraph::new();
    g.add_node(Node::class("root", "Root")).unwrap();
    for layer in 0..depth {
        for col in 0..width {
            g.add_node(Node::class(id(layer, col), format!("Class{layer}x{col}")))
                .unwrap();
        }
    }
    for col in 0..width {
        g.add_edge("root", &id(0, col), EdgeKind::ObjectProperty, "hasPart")
            .unwrap();
    }
    for layer in 1..depth {
        for col in 0..width {
            let source = id(layer - 1, col);
            g.add_edge(&source, &id(layer, col), EdgeKind::ObjectProperty, "next")
                .unwrap();
            if col + 1 < width {
                g.add_edge(&source, &id(layer, col + 1), EdgeKind::ObjectProperty, "across")
                    .unwrap();
            }
        }
    }
    g.populate_all(&MemoryVocabulary::new()).unwrap();
    g
}

fn bench_dual_build(c: &mut Criterion) {
    let g = lattice(20, 20);
    c.bench_function("dual_build_20x20", |bench| {
        bench.iter(|| black_box(DualGraph::build(&g, "root").unwrap()))
    });
}

fn bench_solve(c: &mut Criterion) {
    let g = lattice(20, 20);
    let dual = DualGraph::build(&g, "root").unwrap();
    let terminals: Vec<DualNode> = (0..8)
        .map(|i| DualNode::true_node(format!("n{}_{}", 19 - i, (i * 5) % 20)))
        .collect();

    c.bench_function("steiner_8_terminals_20x20", |bench| {
        bench.iter(|| black_box(steiner::solve(&dual, terminals.clone()).unwrap()))
    });
}

criterion_group!(benches, bench_dual_build, bench_solve);
criterion_main!(benches);
