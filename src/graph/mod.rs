//! Ontology graph and the structures derived from it per query.
//!
//! - **Ontology** ([`OntologyGraph`]): typed directed schema graph whose nodes
//!   and edges carry matchable [`Lexicon`]s. Built once, populated once,
//!   read-only afterwards.
//! - **Dual graph** ([`dual::DualGraph`]): undirected view in which both nodes
//!   and edges of the ontology become vertices, so edges can be required
//!   waypoints of a Steiner tree.
//! - **Steiner solver** ([`steiner::solve`]): approximate minimum tree linking
//!   the root with every matched element, projected back onto the ontology.

pub mod dual;
pub mod lexicon;
pub mod ontology;
pub mod steiner;
pub mod traverse;

use std::fmt;

use serde::Serialize;

pub use lexicon::{Lexicon, LexiconOrigin};
pub use ontology::{Edge, EdgeKind, Matchable, Node, NodeKind, OntologyGraph, OntologySubgraph};

/// A reference to one element of the ontology graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Referent {
    /// A node, by identifier.
    Node(String),
    /// An edge, by (source, target) identifiers.
    Edge(String, String),
}

impl Referent {
    pub fn node(id: impl Into<String>) -> Self {
        Self::Node(id.into())
    }

    pub fn edge(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Edge(source.into(), target.into())
    }
}

impl fmt::Display for Referent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "node {id}"),
            Self::Edge(source, target) => write!(f, "edge {source}->{target}"),
        }
    }
}
