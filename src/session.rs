//! One query run from terms to projected subgraph.
//!
//! A [`QuerySession`] owns every per-query structure: the anchors and their
//! candidates, the dual graph, the Steiner tree and its projection. Nothing
//! is cached between sessions.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::Serialize;

use crate::error::KwResult;
use crate::graph::dual::{DualGraph, DualNode};
use crate::graph::steiner::{self, SteinerTree};
use crate::graph::OntologySubgraph;
use crate::query::resolver::terminals;
use crate::query::{generate_anchors, CandidateResolver, ResolvedAnchor};

/// Result of interpreting one query against one root.
#[derive(Debug)]
pub struct QuerySession {
    terms: Vec<String>,
    root: String,
    resolved: Vec<ResolvedAnchor>,
    dual: DualGraph,
    tree: SteinerTree,
    subgraph: OntologySubgraph,
}

/// Serialisable view of a finished session.
#[derive(Debug, Serialize)]
pub struct Interpretation<'a> {
    pub root: &'a str,
    pub terms: &'a [String],
    pub anchors: &'a [ResolvedAnchor],
    pub tree: &'a SteinerTree,
    pub subgraph: &'a OntologySubgraph,
}

impl QuerySession {
    /// Resolve `terms`, build the dual graph from `root`, and connect every
    /// candidate to the root.
    ///
    /// Stages run strictly in order; an unsatisfiable query surfaces as
    /// [`SolveError::ImpossibleGraph`](crate::error::SolveError::ImpossibleGraph).
    pub fn run<S: AsRef<str>>(
        resolver: &CandidateResolver<'_>,
        root: &str,
        terms: &[S],
    ) -> KwResult<Self> {
        let graph = resolver.graph();
        let terms: Vec<String> = terms.iter().map(|t| t.as_ref().to_string()).collect();

        let anchors = generate_anchors(&terms);
        let resolved = resolver.resolve(&anchors)?;
        tracing::info!(
            anchors = resolved.len(),
            candidates = resolved.iter().map(|r| r.candidates.len()).sum::<usize>(),
            "candidates resolved"
        );

        let dual = DualGraph::build(graph, root)?;
        let required: Vec<DualNode> = terminals(&resolved).iter().map(DualNode::from).collect();
        let tree = steiner::solve(&dual, required)?;

        let ids: HashSet<&str> = tree.true_node_ids().into_iter().collect();
        let subgraph = graph.induced_subgraph(&ids);
        tracing::info!(
            root,
            nodes = subgraph.nodes.len(),
            edges = subgraph.edges.len(),
            "query interpreted"
        );

        Ok(Self {
            terms,
            root: root.to_string(),
            resolved,
            dual,
            tree,
            subgraph,
        })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn resolved(&self) -> &[ResolvedAnchor] {
        &self.resolved
    }

    pub fn dual(&self) -> &DualGraph {
        &self.dual
    }

    pub fn tree(&self) -> &SteinerTree {
        &self.tree
    }

    pub fn subgraph(&self) -> &OntologySubgraph {
        &self.subgraph
    }

    pub fn interpretation(&self) -> Interpretation<'_> {
        Interpretation {
            root: &self.root,
            terms: &self.terms,
            anchors: &self.resolved,
            tree: &self.tree,
            subgraph: &self.subgraph,
        }
    }

    /// Anchors in index order with their candidates; bigrams are indented.
    pub fn dump(&self) -> String {
        dump_anchors(&self.resolved)
    }
}

/// Render resolved anchors one per line, bigrams indented under the unigram
/// they start at.
pub fn dump_anchors(resolved: &[ResolvedAnchor]) -> String {
    let mut ordered: Vec<&ResolvedAnchor> = resolved.iter().collect();
    ordered.sort_by_key(|r| r.anchor.index);

    let mut out = String::new();
    for r in ordered {
        let indent = if r.anchor.is_unigram() { "" } else { "  " };
        let candidates: Vec<String> = r.candidates.iter().map(ToString::to_string).collect();
        let _ = write!(
            out,
            "{indent}{}. {}: [{}]",
            r.anchor.index,
            r.anchor.text,
            candidates.join(", ")
        );
        for skip in &r.skipped {
            let _ = write!(out, " (skipped {}: {})", skip.pass, skip.error);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{KwError, SolveError};
    use crate::graph::{EdgeKind, Node, OntologyGraph};
    use crate::query::ResolverConfig;
    use crate::vocab::MemoryVocabulary;

    fn chain() -> OntologyGraph {
        let mut g = OntologyGraph::new();
        g.add_node(Node::class("A", "Alpha")).unwrap();
        g.add_node(Node::class("B", "Beta")).unwrap();
        g.add_node(Node::class("C", "Gamma")).unwrap();
        g.add_edge("A", "B", EdgeKind::ObjectProperty, "rel1").unwrap();
        g.add_edge("B", "C", EdgeKind::ObjectProperty, "rel2").unwrap();
        g.populate_all(&MemoryVocabulary::new()).unwrap();
        g
    }

    fn resolver(g: &OntologyGraph) -> CandidateResolver<'_> {
        CandidateResolver::new(g).with_config(ResolverConfig {
            parallel: false,
            ..ResolverConfig::default()
        })
    }

    #[test]
    fn term_matching_leaf_pulls_in_path() {
        let g = chain();
        let session = QuerySession::run(&resolver(&g), "A", &["gamma"]).unwrap();
        assert_eq!(session.subgraph().nodes, vec!["A", "B", "C"]);
        assert!(session.subgraph().contains_edge("A", "B"));
        assert!(session.subgraph().contains_edge("B", "C"));
        assert!(session.tree().contains(&DualNode::edge_node("B", "C")));
        assert!(session.tree().is_connected());
    }

    #[test]
    fn no_candidates_yields_root_alone() {
        let g = chain();
        let session = QuerySession::run(&resolver(&g), "B", &["zebra"]).unwrap();
        assert_eq!(session.subgraph().nodes, vec!["B"]);
        assert_eq!(session.tree().weight(), 0);
    }

    #[test]
    fn candidate_behind_root_is_impossible() {
        let g = chain();
        let err = QuerySession::run(&resolver(&g), "B", &["alpha"]).unwrap_err();
        assert!(matches!(
            err,
            KwError::Solve(SolveError::ImpossibleGraph { ref unreachable, .. })
                if unreachable == &vec!["TrueNode(A)".to_string()]
        ));
    }

    #[test]
    fn dump_indents_bigrams() {
        let g = chain();
        let session = QuerySession::run(&resolver(&g), "A", &["beta", "rel2"]).unwrap();
        let dump = session.dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("0. beta: [<direct node B>"));
        assert!(lines[1].starts_with("  1. beta_rel2: ["));
        assert!(lines[2].starts_with("2. rel2: [<direct edge B->C>"));
    }

    #[test]
    fn interpretation_serialises() {
        let g = chain();
        let session = QuerySession::run(&resolver(&g), "A", &["beta"]).unwrap();
        let json = serde_json::to_value(session.interpretation()).unwrap();
        assert_eq!(json["root"], "A");
        assert_eq!(json["subgraph"]["nodes"], serde_json::json!(["A", "B"]));
        assert_eq!(json["anchors"][0]["candidates"][0]["kind"], "direct");
    }
}
