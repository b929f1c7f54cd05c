//! Cycle-safe depth-first listing of everything reachable from a node.
//!
//! Used for diagnostics (`kwgraph reach`); the Steiner pipeline builds its
//! own breadth-first dual graph instead.

use std::collections::HashSet;

use super::ontology::{Edge, Node, OntologyGraph};

/// One step of a [`Reachable`] walk.
#[derive(Debug, Clone, Copy)]
pub enum Reached<'g> {
    Node(&'g Node),
    Edge(&'g Edge),
}

enum Pending<'g> {
    Node(&'g str),
    Edge(&'g Edge),
}

/// Lazy DFS from a start node, following outgoing edges only.
///
/// Each node and each edge is produced exactly once: a node is followed by
/// its outgoing edges, each edge immediately by the subtree under its
/// target. Visited nodes and visited edges are tracked separately.
pub struct Reachable<'g> {
    graph: &'g OntologyGraph,
    stack: Vec<Pending<'g>>,
    seen_nodes: HashSet<&'g str>,
    seen_edges: HashSet<(&'g str, &'g str)>,
}

impl<'g> Iterator for Reachable<'g> {
    type Item = Reached<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(pending) = self.stack.pop() {
            match pending {
                Pending::Node(id) => {
                    let Some(node) = self.graph.node(id) else {
                        continue;
                    };
                    if !self.seen_nodes.insert(node.id.as_str()) {
                        continue;
                    }
                    // Reverse so the first outgoing edge is walked first.
                    for edge in self.graph.outgoing(id).into_iter().rev() {
                        self.stack.push(Pending::Edge(edge));
                    }
                    return Some(Reached::Node(node));
                }
                Pending::Edge(edge) => {
                    if !self
                        .seen_edges
                        .insert((edge.source.as_str(), edge.target.as_str()))
                    {
                        continue;
                    }
                    self.stack.push(Pending::Node(edge.target.as_str()));
                    return Some(Reached::Edge(edge));
                }
            }
        }
        None
    }
}

/// Walk everything reachable from `start`. Unknown start nodes yield nothing.
pub fn reachable_from<'g>(graph: &'g OntologyGraph, start: &'g str) -> Reachable<'g> {
    Reachable {
        graph,
        stack: vec![Pending::Node(start)],
        seen_nodes: HashSet::new(),
        seen_edges: HashSet::new(),
    }
}
