//! Dual graph: nodes *and* edges of the ontology as vertices of an undirected graph.
//!
//! Built per query by a breadth-first walk from the root that only follows
//! outgoing edges. Every ontology edge `(u, v)` reached becomes an
//! [`DualNode::EdgeNode`] joined to `TrueNode(u)` and `TrueNode(v)` by
//! unit-weight dual edges.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;

use crate::error::GraphError;

use super::ontology::{Edge, GraphResult, OntologyGraph};
use super::Referent;

/// A vertex of the dual graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DualNode {
    /// Stands for an ontology node.
    TrueNode(String),
    /// Stands for an ontology edge (source, target).
    EdgeNode(String, String),
}

impl DualNode {
    pub fn true_node(id: impl Into<String>) -> Self {
        Self::TrueNode(id.into())
    }

    pub fn edge_node(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::EdgeNode(source.into(), target.into())
    }

    /// Ontology node id for a `TrueNode`.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::TrueNode(id) => Some(id),
            Self::EdgeNode(..) => None,
        }
    }
}

impl From<Referent> for DualNode {
    fn from(referent: Referent) -> Self {
        match referent {
            Referent::Node(id) => Self::TrueNode(id),
            Referent::Edge(source, target) => Self::EdgeNode(source, target),
        }
    }
}

impl From<&Referent> for DualNode {
    fn from(referent: &Referent) -> Self {
        referent.clone().into()
    }
}

impl fmt::Display for DualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrueNode(id) => write!(f, "TrueNode({id})"),
            Self::EdgeNode(source, target) => write!(f, "EdgeNode({source},{target})"),
        }
    }
}

/// Undirected, unit-weighted dual graph rooted at one ontology node.
pub struct DualGraph {
    root: String,
    graph: UnGraph<DualNode, u32>,
    index: HashMap<DualNode, NodeIndex>,
}

impl DualGraph {
    fn with_root(root: &str) -> Self {
        Self {
            root: root.to_string(),
            graph: UnGraph::default(),
            index: HashMap::new(),
        }
    }

    fn ensure(&mut self, node: DualNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.index.insert(node, idx);
        idx
    }

    /// Root ontology node the walk started from.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn root_node(&self) -> DualNode {
        DualNode::TrueNode(self.root.clone())
    }

    pub fn contains(&self, node: &DualNode) -> bool {
        self.index.contains_key(node)
    }

    pub fn index_of(&self, node: &DualNode) -> Option<NodeIndex> {
        self.index.get(node).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &DualNode {
        &self.graph[idx]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Vertices in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &DualNode> {
        self.graph.node_weights()
    }

    /// Neighbours of `idx` ordered by insertion, for deterministic walks.
    pub fn neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn has_edge(&self, a: &DualNode, b: &DualNode) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(a), Some(b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Build the dual graph reachable from `root` via outgoing edges only.
    pub fn build(ontology: &OntologyGraph, root: &str) -> GraphResult<Self> {
        ontology.ensure_populated()?;
        if !ontology.has_node(root) {
            return Err(GraphError::NodeNotFound {
                id: root.to_string(),
            });
        }

        enum Visit<'g> {
            Node(&'g str),
            Edge(&'g Edge),
        }

        let mut dual = Self::with_root(root);
        let mut seen_nodes: HashSet<&str> = HashSet::new();
        let mut seen_edges: HashSet<(&str, &str)> = HashSet::new();
        let mut queue: VecDeque<Visit<'_>> =
            VecDeque::with_capacity(ontology.node_count() + ontology.edge_count());
        queue.push_back(Visit::Node(root));

        while let Some(visit) = queue.pop_front() {
            match visit {
                Visit::Node(id) => {
                    if !seen_nodes.insert(id) {
                        continue;
                    }
                    dual.ensure(DualNode::true_node(id));
                    for edge in ontology.outgoing(id) {
                        queue.push_back(Visit::Edge(edge));
                    }
                }
                Visit::Edge(edge) => {
                    let key = (edge.source.as_str(), edge.target.as_str());
                    if !seen_edges.insert(key) {
                        continue;
                    }
                    let source = dual.ensure(DualNode::true_node(&edge.source));
                    let edge_node =
                        dual.ensure(DualNode::edge_node(&edge.source, &edge.target));
                    let target = dual.ensure(DualNode::true_node(&edge.target));
                    dual.graph.add_edge(source, edge_node, 1);
                    dual.graph.add_edge(edge_node, target, 1);
                    queue.push_back(Visit::Node(edge.target.as_str()));
                }
            }
        }

        tracing::debug!(
            root,
            vertices = dual.node_count(),
            edges = dual.edge_count(),
            "dual graph built"
        );
        Ok(dual)
    }
}

impl fmt::Debug for DualGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualGraph")
            .field("root", &self.root)
            .field("vertices", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ontology::{EdgeKind, Node};
    use crate::vocab::MemoryVocabulary;

    fn populated(nodes: &[&str], edges: &[(&str, &str)]) -> OntologyGraph {
        let mut g = OntologyGraph::new();
        for id in nodes {
            g.add_node(Node::class(*id, id.to_uppercase())).unwrap();
        }
        for (i, (s, t)) in edges.iter().enumerate() {
            g.add_edge(s, t, EdgeKind::ObjectProperty, &format!("rel{}", i + 1))
                .unwrap();
        }
        g.populate_all(&MemoryVocabulary::new()).unwrap();
        g
    }

    #[test]
    fn chain_becomes_alternating_path() {
        let g = populated(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let dual = DualGraph::build(&g, "A").unwrap();
        assert_eq!(dual.node_count(), 5);
        assert_eq!(dual.edge_count(), 4);
        assert!(dual.has_edge(&DualNode::true_node("A"), &DualNode::edge_node("A", "B")));
        assert!(dual.has_edge(&DualNode::edge_node("A", "B"), &DualNode::true_node("B")));
        assert!(dual.has_edge(&DualNode::edge_node("B", "C"), &DualNode::true_node("C")));
        assert!(!dual.has_edge(&DualNode::true_node("A"), &DualNode::true_node("B")));
    }

    #[test]
    fn reverse_edges_are_not_followed() {
        // B -> A exists, but nothing leaves A.
        let g = populated(&["A", "B"], &[("B", "A")]);
        let dual = DualGraph::build(&g, "A").unwrap();
        assert_eq!(dual.node_count(), 1);
        assert!(dual.contains(&DualNode::true_node("A")));
        assert!(!dual.contains(&DualNode::true_node("B")));
        assert!(!dual.contains(&DualNode::edge_node("B", "A")));
    }

    #[test]
    fn cycles_visit_each_element_once() {
        let g = populated(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let dual = DualGraph::build(&g, "A").unwrap();
        assert_eq!(dual.node_count(), 4);
        assert_eq!(dual.edge_count(), 4);
    }

    #[test]
    fn unknown_root_and_unpopulated_graph() {
        let g = populated(&["A"], &[]);
        assert!(matches!(
            DualGraph::build(&g, "Z"),
            Err(GraphError::NodeNotFound { .. })
        ));

        let mut raw = OntologyGraph::new();
        raw.add_node(Node::class("A", "A")).unwrap();
        assert!(matches!(
            DualGraph::build(&raw, "A"),
            Err(GraphError::NotPopulated)
        ));
    }

    #[test]
    fn referent_conversion() {
        assert_eq!(
            DualNode::from(Referent::edge("a", "b")),
            DualNode::edge_node("a", "b")
        );
        assert_eq!(DualNode::true_node("x").node_id(), Some("x"));
        assert_eq!(DualNode::edge_node("x", "y").to_string(), "EdgeNode(x,y)");
    }
}
