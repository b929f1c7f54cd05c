// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # kwgraph
//!
//! Keyword search over structured data: interprets a list of query terms as
//! the smallest piece of a typed ontology schema that links every term back
//! to a chosen root class.
//!
//! ## Architecture
//!
//! - **Ontology graph** (`graph`): petgraph-backed typed graph with per-element
//!   lexicons, dual-graph construction and a Steiner-tree solver
//! - **Schema** (`schema`): TOML catalog of classes, leaves and properties,
//!   with root-scoped edges
//! - **Vocabularies** (`vocab`): ranked leaf values from JSON histograms
//! - **Matching** (`similarity`, `synonym`, `query`): exact, edit-distance,
//!   similarity and synonym-expanded candidate resolution
//! - **Sessions** (`session`): one query from terms to projected subgraph
//!
//! ## Library usage
//!
//! ```no_run
//! use kwgraph::query::CandidateResolver;
//! use kwgraph::schema::SchemaDoc;
//! use kwgraph::session::QuerySession;
//! use kwgraph::vocab::HistogramStore;
//!
//! let schema = SchemaDoc::bundled_ht().unwrap();
//! let mut graph = schema.build_graph("seller").unwrap();
//! graph.populate_all(&HistogramStore::new("data/cache")).unwrap();
//!
//! let resolver = CandidateResolver::new(&graph);
//! let session = QuerySession::run(&resolver, "seller", &["blue", "eyes"]).unwrap();
//! for id in &session.subgraph().nodes {
//!     println!("{id}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod query;
pub mod schema;
pub mod session;
pub mod similarity;
pub mod synonym;
pub mod vocab;
