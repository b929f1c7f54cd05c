//! Schema catalog: the classes, leaves and properties a graph is built from.
//!
//! Schemas are TOML documents with a `[domain]` table, `[[nodes]]` and
//! `[[edges]]`. An edge may carry a `root_scope`; it is then installed only
//! when the graph is built for one of those roots.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::SchemaError;
use crate::graph::{EdgeKind, Node, OntologyGraph};
use crate::similarity::{HybridJaccard, MatcherSpec};

const HT_TOML: &str = include_str!("../data/schema/ht.toml");

// ── Document ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeDecl {
    Class {
        id: String,
        class_name: String,
        /// Name of the search index rooted at this class, if any.
        #[serde(default)]
        index_root: Option<String>,
    },
    Leaf {
        id: String,
        vocab: String,
        #[serde(default)]
        matcher: Option<MatcherSpec>,
    },
}

impl NodeDecl {
    pub fn id(&self) -> &str {
        match self {
            Self::Class { id, .. } | Self::Leaf { id, .. } => id,
        }
    }

    fn is_root(&self) -> bool {
        matches!(self, Self::Class { index_root: Some(_), .. })
    }

    fn to_node(&self) -> Result<Node, SchemaError> {
        match self {
            Self::Class { id, class_name, .. } => Ok(Node::class(id, class_name)),
            Self::Leaf { id, vocab, matcher } => {
                let node = Node::leaf(id, vocab);
                match matcher {
                    Some(spec) => Ok(node.with_matcher(Arc::new(HybridJaccard::from_spec(id, spec)?))),
                    None => Ok(node),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDeclKind {
    Object,
    Data,
}

impl From<EdgeDeclKind> for EdgeKind {
    fn from(kind: EdgeDeclKind) -> Self {
        match kind {
            EdgeDeclKind::Object => EdgeKind::ObjectProperty,
            EdgeDeclKind::Data => EdgeKind::DataProperty,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeDecl {
    pub source: String,
    pub target: String,
    pub kind: EdgeDeclKind,
    pub relation: String,
    /// Roots for which this edge exists; absent means all of them.
    #[serde(default)]
    pub root_scope: Option<Vec<String>>,
}

impl EdgeDecl {
    pub fn applies_to(&self, root: &str) -> bool {
        self.root_scope
            .as_ref()
            .is_none_or(|scope| scope.iter().any(|r| r == root))
    }
}

/// A parsed schema document.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDoc {
    #[serde(default)]
    pub domain: DomainMeta,
    #[serde(default)]
    pub nodes: Vec<NodeDecl>,
    #[serde(default)]
    pub edges: Vec<EdgeDecl>,
}

impl SchemaDoc {
    /// Parse a schema from TOML text; `name` is used in error reports.
    pub fn from_toml(name: &str, content: &str) -> Result<Self, SchemaError> {
        toml::from_str(content).map_err(|e| SchemaError::Parse {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a schema file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&path.display().to_string(), &content)
    }

    /// The bundled offer/seller domain.
    pub fn bundled_ht() -> Result<Self, SchemaError> {
        Self::from_toml("ht", HT_TOML)
    }

    /// Nodes a graph may be rooted at: the declared index roots, or every
    /// node when the schema declares none.
    pub fn roots(&self) -> Vec<&str> {
        let declared: Vec<&str> = self
            .nodes
            .iter()
            .filter(|n| n.is_root())
            .map(NodeDecl::id)
            .collect();
        if declared.is_empty() {
            self.nodes.iter().map(NodeDecl::id).collect()
        } else {
            declared
        }
    }

    /// Build the unpopulated graph for `root`, installing only the edges
    /// scoped to it.
    pub fn build_graph(&self, root: &str) -> Result<OntologyGraph, SchemaError> {
        let roots: HashSet<&str> = self.roots().into_iter().collect();
        if !roots.contains(root) {
            return Err(SchemaError::UnknownRoot {
                root: root.to_string(),
            });
        }
        for scoped in self.edges.iter().filter_map(|e| e.root_scope.as_ref()) {
            if let Some(unknown) = scoped.iter().find(|r| !roots.contains(r.as_str())) {
                return Err(SchemaError::UnknownRoot {
                    root: unknown.clone(),
                });
            }
        }

        let mut graph = OntologyGraph::new();
        for decl in &self.nodes {
            graph.add_node(decl.to_node()?)?;
        }
        let mut skipped = 0usize;
        for edge in &self.edges {
            if edge.applies_to(root) {
                graph.add_edge(&edge.source, &edge.target, edge.kind.into(), &edge.relation)?;
            } else {
                skipped += 1;
            }
        }

        tracing::info!(
            domain = %self.domain.name,
            root,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            out_of_scope = skipped,
            "schema graph built"
        );
        Ok(graph)
    }
}
