//! Typed ontology graph backed by petgraph.
//!
//! Nodes are classes or leaves, edges are object or data properties. Each
//! element carries a [`Lexicon`] filled by [`OntologyGraph::populate_all`];
//! after population the graph is sealed and only read.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::error::{BackendError, GraphError, SchemaError};
use crate::similarity::SimilarityMatcher;
use crate::vocab::VocabularyStore;

use super::lexicon::{camel_case_words, normalize, Lexicon, LexiconOrigin};
use super::Referent;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// What a node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum NodeKind {
    /// An ontology class; matched by its identifier and class name.
    Class { class_name: String },
    /// A data-property value slot; matched by observed values.
    Leaf { vocab: String },
}

/// Ontology node.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    lexicon: Option<Lexicon>,
    matcher: Option<Arc<dyn SimilarityMatcher>>,
}

impl Node {
    pub fn class(id: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Class {
                class_name: class_name.into(),
            },
            lexicon: None,
            matcher: None,
        }
    }

    pub fn leaf(id: impl Into<String>, vocab: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Leaf {
                vocab: vocab.into(),
            },
            lexicon: None,
            matcher: None,
        }
    }

    /// Attach a similarity matcher (leaves only in practice).
    pub fn with_matcher(mut self, matcher: Arc<dyn SimilarityMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Class name for classes, `None` for leaves.
    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Class { class_name } => Some(class_name),
            NodeKind::Leaf { .. } => None,
        }
    }
}

/// Kind of property an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    ObjectProperty,
    DataProperty,
}

/// Ontology edge. Unique per ordered (source, target) pair.
#[derive(Debug, Clone)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub relation: String,
    lexicon: Option<Lexicon>,
}

/// Matching contract shared by nodes and edges.
pub trait Matchable {
    fn referent(&self) -> Referent;

    /// `None` until the graph has been populated.
    fn lexicon(&self) -> Option<&Lexicon>;

    fn matcher(&self) -> Option<&dyn SimilarityMatcher> {
        None
    }

    /// Normalised membership test against the lexicon.
    fn exact_match(&self, term: &str) -> bool {
        self.lexicon().is_some_and(|lex| lex.contains(term))
    }

    /// First lexicon value within `max_distance` edits of `term` (and
    /// strictly beyond `exclude_distance`, when given).
    fn fuzzy_match(
        &self,
        term: &str,
        max_distance: usize,
        exclude_distance: Option<usize>,
    ) -> Option<(String, usize)> {
        self.lexicon()?
            .within_distance(term, max_distance, exclude_distance)
    }

    /// Ask the element's matcher for the best value and accept it only if it
    /// is one of the lexicon values. Elements without a matcher never match.
    fn similarity_match(
        &self,
        term: &str,
        allow_exact: bool,
    ) -> Result<Option<String>, BackendError> {
        let (Some(matcher), Some(lexicon)) = (self.matcher(), self.lexicon()) else {
            return Ok(None);
        };
        let Some(best) = matcher.find_best_match(&normalize(term))? else {
            return Ok(None);
        };
        Ok(lexicon.confirm(term, &best, allow_exact))
    }
}

impl Matchable for Node {
    fn referent(&self) -> Referent {
        Referent::Node(self.id.clone())
    }

    fn lexicon(&self) -> Option<&Lexicon> {
        self.lexicon.as_ref()
    }

    fn matcher(&self) -> Option<&dyn SimilarityMatcher> {
        self.matcher.as_deref()
    }
}

impl Matchable for Edge {
    fn referent(&self) -> Referent {
        Referent::Edge(self.source.clone(), self.target.clone())
    }

    fn lexicon(&self) -> Option<&Lexicon> {
        self.lexicon.as_ref()
    }
}

/// An edge of a projected subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubgraphEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Induced subgraph of the ontology over a node set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OntologySubgraph {
    /// Node identifiers in graph insertion order.
    pub nodes: Vec<String>,
    /// Every ontology edge whose endpoints are both in `nodes`.
    pub edges: Vec<SubgraphEdge>,
}

impl OntologySubgraph {
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n == id)
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.source == source && e.target == target)
    }
}

/// Typed directed ontology graph.
pub struct OntologyGraph {
    graph: DiGraph<Node, Edge>,
    node_index: HashMap<String, NodeIndex>,
    edge_index: HashMap<(String, String), EdgeIndex>,
    populated: bool,
}

impl OntologyGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            populated: false,
        }
    }

    /// Add a node. Only valid before population.
    pub fn add_node(&mut self, node: Node) -> Result<(), SchemaError> {
        if self.populated {
            return Err(SchemaError::Sealed);
        }
        if self.node_index.contains_key(&node.id) {
            return Err(SchemaError::DuplicateNode { id: node.id });
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        Ok(())
    }

    /// Add an edge between two existing nodes. Only valid before population.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        kind: EdgeKind,
        relation: &str,
    ) -> Result<(), SchemaError> {
        if self.populated {
            return Err(SchemaError::Sealed);
        }
        let endpoint = |id: &str| {
            self.node_index
                .get(id)
                .copied()
                .ok_or_else(|| SchemaError::UnknownEndpoint {
                    source_id: source.to_string(),
                    target: target.to_string(),
                    missing: id.to_string(),
                })
        };
        let src = endpoint(source)?;
        let dst = endpoint(target)?;

        let key = (source.to_string(), target.to_string());
        if self.edge_index.contains_key(&key) {
            return Err(SchemaError::DuplicateEdge {
                source_id: key.0,
                target: key.1,
            });
        }
        let edge = Edge {
            source: key.0.clone(),
            target: key.1.clone(),
            kind,
            relation: relation.to_string(),
            lexicon: None,
        };
        let idx = self.graph.add_edge(src, dst, edge);
        self.edge_index.insert(key, idx);
        Ok(())
    }

    /// Fill every lexicon and seal the graph.
    ///
    /// Classes use {identifier, class name}, leaves issue one vocabulary
    /// load each, edges use their camel-case-split relation name. Nothing is
    /// committed unless every leaf loads; running it again recomputes the
    /// same lexicons.
    pub fn populate_all(&mut self, vocab: &dyn VocabularyStore) -> GraphResult<()> {
        let mut node_lexicons = Vec::with_capacity(self.graph.node_count());
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let lexicon = match &node.kind {
                NodeKind::Class { class_name } => Lexicon::new(
                    LexiconOrigin::Ontology,
                    [node.id.clone(), class_name.clone()],
                ),
                NodeKind::Leaf { vocab: descriptor } => {
                    let values = vocab
                        .load(descriptor)
                        .map_err(|source| GraphError::Population { source })?;
                    if values.is_empty() {
                        return Err(GraphError::Population {
                            source: crate::error::VocabLoadError::Malformed {
                                descriptor: descriptor.clone(),
                                message: "no values".into(),
                            },
                        });
                    }
                    Lexicon::new(LexiconOrigin::LeafVocab, values)
                }
            };
            node_lexicons.push((idx, lexicon));
        }

        for (idx, lexicon) in node_lexicons {
            self.graph[idx].lexicon = Some(lexicon);
        }
        for edge in self.graph.edge_weights_mut() {
            edge.lexicon = Some(Lexicon::new(
                LexiconOrigin::Ontology,
                [camel_case_words(&edge.relation)],
            ));
        }
        self.populated = true;

        tracing::info!(
            nodes = self.node_count(),
            edges = self.edge_count(),
            "ontology graph populated"
        );
        Ok(())
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Fail with [`GraphError::NotPopulated`] unless population has run.
    pub fn ensure_populated(&self) -> GraphResult<()> {
        if self.populated {
            Ok(())
        } else {
            Err(GraphError::NotPopulated)
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|idx| &self.graph[*idx])
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edge_index
            .get(&(source.to_string(), target.to_string()))
            .map(|idx| &self.graph[*idx])
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    /// Outgoing edges of `id`, in insertion order.
    pub fn outgoing(&self, id: &str) -> Vec<&Edge> {
        let Some(&idx) = self.node_index.get(id) else {
            return vec![];
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.weight()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, e)| e).collect()
    }

    /// Look up the element a referent names.
    pub fn element(&self, referent: &Referent) -> GraphResult<&dyn Matchable> {
        match referent {
            Referent::Node(id) => self
                .node(id)
                .map(|n| n as &dyn Matchable)
                .ok_or_else(|| GraphError::NodeNotFound { id: id.clone() }),
            Referent::Edge(source, target) => self
                .edge(source, target)
                .map(|e| e as &dyn Matchable)
                .ok_or_else(|| GraphError::EdgeNotFound {
                    source_id: source.clone(),
                    target: target.clone(),
                }),
        }
    }

    /// Class name of a node or relation name of an edge.
    pub fn label(&self, referent: &Referent) -> Option<&str> {
        match referent {
            Referent::Node(id) => self.node(id)?.label(),
            Referent::Edge(source, target) => Some(&self.edge(source, target)?.relation),
        }
    }

    /// Induced subgraph over `ids`: those nodes plus every edge between them.
    pub fn induced_subgraph(&self, ids: &HashSet<&str>) -> OntologySubgraph {
        let nodes = self
            .nodes()
            .filter(|n| ids.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        let edges = self
            .edges()
            .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
            .map(|e| SubgraphEdge {
                source: e.source.clone(),
                target: e.target.clone(),
                relation: e.relation.clone(),
            })
            .collect();
        OntologySubgraph { nodes, edges }
    }
}

impl Default for OntologyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OntologyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OntologyGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("populated", &self.populated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VocabLoadError;
    use crate::vocab::MemoryVocabulary;

    fn small_graph() -> OntologyGraph {
        let mut g = OntologyGraph::new();
        g.add_node(Node::class("seller", "PersonOrOrganization")).unwrap();
        g.add_node(Node::class("phone", "PhoneNumber")).unwrap();
        g.add_node(Node::leaf("phone.name", "seller_telephone_name")).unwrap();
        g.add_edge("seller", "phone", EdgeKind::ObjectProperty, "telephone")
            .unwrap();
        g.add_edge("phone", "phone.name", EdgeKind::DataProperty, "phoneName")
            .unwrap();
        g
    }

    fn vocab() -> MemoryVocabulary {
        MemoryVocabulary::new().with("seller_telephone_name", &["5551234", "5559876"])
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let mut g = small_graph();
        let err = g
            .add_edge("seller", "offer", EdgeKind::ObjectProperty, "makesOffer")
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownEndpoint { ref missing, .. } if missing == "offer"
        ));
    }

    #[test]
    fn duplicate_ordered_pair_is_rejected() {
        let mut g = small_graph();
        let err = g
            .add_edge("seller", "phone", EdgeKind::ObjectProperty, "mobile")
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateEdge { .. }));
        // The reverse direction is a different pair.
        g.add_edge("phone", "seller", EdgeKind::ObjectProperty, "owner")
            .unwrap();
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let mut g = small_graph();
        assert!(matches!(
            g.add_node(Node::class("phone", "Phone")),
            Err(SchemaError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn populate_fills_every_lexicon() {
        let mut g = small_graph();
        g.populate_all(&vocab()).unwrap();

        let seller = g.node("seller").unwrap();
        assert_eq!(
            seller.lexicon().unwrap().values(),
            &["seller".to_string(), "PersonOrOrganization".to_string()]
        );
        let leaf = g.node("phone.name").unwrap();
        assert_eq!(leaf.lexicon().unwrap().origin(), LexiconOrigin::LeafVocab);
        assert_eq!(leaf.lexicon().unwrap().len(), 2);
        let edge = g.edge("phone", "phone.name").unwrap();
        assert_eq!(edge.lexicon().unwrap().values(), &["phone Name".to_string()]);

        assert!(g.nodes().all(|n| n.lexicon().is_some_and(|l| !l.is_empty())));
        assert!(g.edges().all(|e| e.lexicon().is_some_and(|l| !l.is_empty())));
    }

    #[test]
    fn populate_is_idempotent() {
        let mut g = small_graph();
        let store = vocab();
        g.populate_all(&store).unwrap();
        let first: Vec<_> = g.nodes().map(|n| n.lexicon().cloned()).collect();
        g.populate_all(&store).unwrap();
        let second: Vec<_> = g.nodes().map(|n| n.lexicon().cloned()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn failed_population_leaves_graph_unusable() {
        let mut g = small_graph();
        let err = g.populate_all(&MemoryVocabulary::new()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Population {
                source: VocabLoadError::UnknownDescriptor { .. }
            }
        ));
        assert!(!g.is_populated());
        assert!(g.node("seller").unwrap().lexicon().is_none());
        assert!(matches!(g.ensure_populated(), Err(GraphError::NotPopulated)));
    }

    #[test]
    fn graph_is_sealed_after_population() {
        let mut g = small_graph();
        g.populate_all(&vocab()).unwrap();
        assert!(matches!(
            g.add_node(Node::class("email", "EmailAddress")),
            Err(SchemaError::Sealed)
        ));
        assert!(matches!(
            g.add_edge("phone", "seller", EdgeKind::ObjectProperty, "owner"),
            Err(SchemaError::Sealed)
        ));
    }

    #[test]
    fn exact_and_fuzzy_matching() {
        let mut g = small_graph();
        g.populate_all(&vocab()).unwrap();
        let phone = g.node("phone").unwrap();
        assert!(phone.exact_match("Phone"));
        assert!(phone.exact_match("phonenumber"));
        assert!(!phone.exact_match("phones"));
        assert_eq!(
            phone.fuzzy_match("phones", 1, Some(0)),
            Some(("phone".to_string(), 1))
        );
        assert_eq!(phone.fuzzy_match("phone", 1, Some(0)), None);

        let edge = g.element(&Referent::edge("phone", "phone.name")).unwrap();
        assert!(edge.exact_match("phone_name"));
    }

    #[test]
    fn outgoing_keeps_insertion_order() {
        let mut g = OntologyGraph::new();
        for id in ["a", "b", "c", "d"] {
            g.add_node(Node::class(id, id.to_uppercase())).unwrap();
        }
        g.add_edge("a", "c", EdgeKind::ObjectProperty, "r1").unwrap();
        g.add_edge("a", "b", EdgeKind::ObjectProperty, "r2").unwrap();
        g.add_edge("a", "d", EdgeKind::ObjectProperty, "r3").unwrap();
        let targets: Vec<_> = g.outgoing("a").iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["c", "b", "d"]);
    }

    #[test]
    fn labels_and_induced_subgraph() {
        let g = small_graph();
        assert_eq!(g.label(&Referent::node("phone")), Some("PhoneNumber"));
        assert_eq!(g.label(&Referent::node("phone.name")), None);
        assert_eq!(
            g.label(&Referent::edge("seller", "phone")),
            Some("telephone")
        );

        let ids: HashSet<&str> = ["seller", "phone"].into_iter().collect();
        let sub = g.induced_subgraph(&ids);
        assert_eq!(sub.nodes, vec!["seller", "phone"]);
        assert_eq!(sub.edges.len(), 1);
        assert!(sub.contains_edge("seller", "phone"));
        assert!(!sub.contains_node("phone.name"));
    }
}
