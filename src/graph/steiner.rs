//! Approximate minimum Steiner tree over a [`DualGraph`].
//!
//! Kou–Markowsky–Berman 2-approximation:
//!
//! 1. BFS from every terminal (all dual edges weigh 1).
//! 2. Minimum spanning tree of the complete terminal graph weighted by those
//!    distances; ties go to the earlier terminal pair.
//! 3. Each MST edge is replaced by the BFS path that established its distance.
//! 4. Minimum spanning tree of the union of those paths, then non-terminal
//!    leaves are pruned.
//!
//! Every choice is made in vertex insertion order so identical inputs always
//! produce identical trees.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::error::SolveError;

use super::dual::{DualGraph, DualNode};
use super::ontology::{OntologyGraph, OntologySubgraph};

/// The connecting structure returned by [`solve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SteinerTree {
    pub root: DualNode,
    /// Required vertices: the root first, then matched elements.
    pub terminals: Vec<DualNode>,
    /// Tree vertices in dual-graph insertion order.
    pub nodes: Vec<DualNode>,
    /// Tree edges, each listed once.
    pub edges: Vec<(DualNode, DualNode)>,
}

impl SteinerTree {
    pub fn contains(&self, node: &DualNode) -> bool {
        self.nodes.contains(node)
    }

    /// Total weight; every dual edge weighs 1.
    pub fn weight(&self) -> usize {
        self.edges.len()
    }

    /// Ontology node ids of the tree's `TrueNode`s.
    pub fn true_node_ids(&self) -> Vec<&str> {
        self.nodes.iter().filter_map(DualNode::node_id).collect()
    }

    /// Whether every vertex is reachable from the root over tree edges.
    pub fn is_connected(&self) -> bool {
        let mut adjacency: HashMap<&DualNode, Vec<&DualNode>> = HashMap::new();
        for (a, b) in &self.edges {
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }
        let mut seen: HashSet<&DualNode> = HashSet::from([&self.root]);
        let mut queue = VecDeque::from([&self.root]);
        while let Some(node) = queue.pop_front() {
            for &next in adjacency.get(node).into_iter().flatten() {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        self.nodes.iter().all(|n| seen.contains(n))
    }

    /// Induced ontology subgraph over the tree's `TrueNode`s.
    pub fn project(&self, ontology: &OntologyGraph) -> OntologySubgraph {
        let ids: HashSet<&str> = self.true_node_ids().into_iter().collect();
        ontology.induced_subgraph(&ids)
    }
}

/// Single-source BFS distances and parents over dense dual indices.
struct BfsTree {
    dist: Vec<Option<usize>>,
    parent: Vec<Option<NodeIndex>>,
}

impl BfsTree {
    fn run(dual: &DualGraph, source: NodeIndex) -> Self {
        let n = dual.node_count();
        let mut dist = vec![None; n];
        let mut parent = vec![None; n];
        dist[source.index()] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            let d = dist[node.index()].unwrap_or_default();
            for next in dual.neighbors(node) {
                if dist[next.index()].is_none() {
                    dist[next.index()] = Some(d + 1);
                    parent[next.index()] = Some(node);
                    queue.push_back(next);
                }
            }
        }
        Self { dist, parent }
    }

    /// Vertices on the path source → `target`, as consecutive pairs.
    fn path_edges(&self, target: NodeIndex) -> Vec<(NodeIndex, NodeIndex)> {
        let mut edges = Vec::new();
        let mut current = target;
        while let Some(prev) = self.parent[current.index()] {
            edges.push(ordered(prev, current));
            current = prev;
        }
        edges
    }
}

fn ordered(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Kruskal over pre-sorted unit or weighted edges; keeps the accepted ones.
fn kruskal<T: Copy>(
    size: usize,
    edges: impl IntoIterator<Item = (usize, usize, T)>,
) -> Vec<(usize, usize, T)> {
    let mut sets = UnionFind::<usize>::new(size);
    edges
        .into_iter()
        .filter(|(a, b, _)| sets.union(*a, *b))
        .collect()
}

/// Compute the Steiner tree connecting the dual graph's root with `terminals`.
///
/// Fails with [`SolveError::ImpossibleGraph`] naming every terminal the
/// dual-graph walk from the root never reached.
pub fn solve(
    dual: &DualGraph,
    terminals: impl IntoIterator<Item = DualNode>,
) -> Result<SteinerTree, SolveError> {
    let root = dual.root_node();
    let Some(root_idx) = dual.index_of(&root) else {
        return Err(SolveError::MissingRoot {
            root: dual.root().to_string(),
        });
    };

    let mut required = vec![root.clone()];
    for terminal in terminals {
        if !required.contains(&terminal) {
            required.push(terminal);
        }
    }

    let unreachable: Vec<String> = required
        .iter()
        .filter(|t| !dual.contains(t))
        .map(ToString::to_string)
        .collect();
    if !unreachable.is_empty() {
        return Err(SolveError::ImpossibleGraph {
            root: dual.root().to_string(),
            unreachable,
        });
    }
    let indices: Vec<NodeIndex> = required
        .iter()
        .filter_map(|t| dual.index_of(t))
        .collect();

    // Step 1: one BFS per terminal.
    let trees: Vec<BfsTree> = indices.iter().map(|&t| BfsTree::run(dual, t)).collect();

    // Step 2: MST of the terminal distance graph.
    let mut closure = Vec::new();
    let mut disconnected = Vec::new();
    for i in 0..indices.len() {
        for j in (i + 1)..indices.len() {
            match trees[i].dist[indices[j].index()] {
                Some(d) => closure.push((i, j, d)),
                None => disconnected.push(required[j].to_string()),
            }
        }
    }
    if !disconnected.is_empty() {
        disconnected.dedup();
        return Err(SolveError::ImpossibleGraph {
            root: dual.root().to_string(),
            unreachable: disconnected,
        });
    }
    closure.sort_by_key(|&(i, j, d)| (d, i, j));
    let terminal_mst = kruskal(indices.len(), closure);

    // Step 3: expand MST edges into dual-graph paths.
    let mut union: Vec<(NodeIndex, NodeIndex)> = Vec::new();
    let mut seen: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    for (i, j, _) in terminal_mst {
        for edge in trees[i].path_edges(indices[j]) {
            if seen.insert(edge) {
                union.push(edge);
            }
        }
    }

    // Step 4: MST of the union, then prune non-terminal leaves.
    union.sort();
    let mut tree_edges: Vec<(NodeIndex, NodeIndex)> = kruskal(
        dual.node_count(),
        union.into_iter().map(|(a, b)| (a.index(), b.index(), ())),
    )
    .into_iter()
    .map(|(a, b, ())| (NodeIndex::new(a), NodeIndex::new(b)))
    .collect();

    let terminal_set: HashSet<NodeIndex> = indices.iter().copied().collect();
    loop {
        let mut degree: HashMap<NodeIndex, usize> = HashMap::new();
        for (a, b) in &tree_edges {
            *degree.entry(*a).or_default() += 1;
            *degree.entry(*b).or_default() += 1;
        }
        let leaves: HashSet<NodeIndex> = degree
            .into_iter()
            .filter(|(n, d)| *d == 1 && !terminal_set.contains(n))
            .map(|(n, _)| n)
            .collect();
        if leaves.is_empty() {
            break;
        }
        tree_edges.retain(|(a, b)| !leaves.contains(a) && !leaves.contains(b));
    }

    let mut vertices: Vec<NodeIndex> = tree_edges
        .iter()
        .flat_map(|&(a, b)| [a, b])
        .chain(std::iter::once(root_idx))
        .chain(indices.iter().copied())
        .collect();
    vertices.sort();
    vertices.dedup();

    let tree = SteinerTree {
        root,
        terminals: required,
        nodes: vertices.iter().map(|&i| dual.node(i).clone()).collect(),
        edges: tree_edges
            .iter()
            .map(|&(a, b)| (dual.node(a).clone(), dual.node(b).clone()))
            .collect(),
    };
    tracing::debug!(
        terminals = tree.terminals.len(),
        vertices = tree.nodes.len(),
        weight = tree.weight(),
        "steiner tree computed"
    );
    Ok(tree)
}
