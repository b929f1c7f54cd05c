//! Rich diagnostic error types for kwgraph.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers know exactly
//! which stage of query interpretation failed and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for kwgraph.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum KwError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Vocab(#[from] VocabLoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("duplicate node: \"{id}\"")]
    #[diagnostic(
        code(kw::schema::duplicate_node),
        help("Node identifiers must be unique within a schema. Rename one of the nodes.")
    )]
    DuplicateNode { id: String },

    #[error("edge {source_id} -> {target} references unknown node \"{missing}\"")]
    #[diagnostic(
        code(kw::schema::unknown_endpoint),
        help("Declare both endpoint nodes before the edge that connects them.")
    )]
    UnknownEndpoint {
        source_id: String,
        target: String,
        missing: String,
    },

    #[error("duplicate edge: {source_id} -> {target}")]
    #[diagnostic(
        code(kw::schema::duplicate_edge),
        help(
            "Only one edge is allowed per ordered node pair. \
             Merge the relations or route one of them through an intermediate class."
        )
    )]
    DuplicateEdge { source_id: String, target: String },

    #[error("graph is sealed: structural changes are not allowed after population")]
    #[diagnostic(
        code(kw::schema::sealed),
        help("Add every node and edge before calling `populate_all`.")
    )]
    Sealed,

    #[error("unknown root: \"{root}\"")]
    #[diagnostic(
        code(kw::schema::unknown_root),
        help("The root must name a node of the schema. Use `kwgraph schema` to list nodes.")
    )]
    UnknownRoot { root: String },

    #[error("invalid matcher on node \"{id}\": {message}")]
    #[diagnostic(
        code(kw::schema::matcher),
        help("Matcher thresholds must lie in (0.0, 1.0] and at least one reference value is required.")
    )]
    InvalidMatcher { id: String, message: String },

    #[error("failed to parse schema \"{name}\": {message}")]
    #[diagnostic(
        code(kw::schema::parse),
        help("Check the schema TOML syntax: [domain], [[nodes]] and [[edges]] tables.")
    )]
    Parse { name: String, message: String },

    #[error("failed to read schema file: {path}")]
    #[diagnostic(code(kw::schema::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Vocabulary errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum VocabLoadError {
    #[error("unknown vocabulary descriptor: \"{descriptor}\"")]
    #[diagnostic(
        code(kw::vocab::unknown_descriptor),
        help(
            "No histogram exists for this descriptor. Check `vocab_dir` in the \
             configuration and that `<descriptor>.json` is present."
        )
    )]
    UnknownDescriptor { descriptor: String },

    #[error("failed to read vocabulary \"{descriptor}\" from {path}")]
    #[diagnostic(code(kw::vocab::io), help("Ensure the histogram file is readable."))]
    Io {
        descriptor: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed vocabulary \"{descriptor}\": {message}")]
    #[diagnostic(
        code(kw::vocab::malformed),
        help("A histogram file must be a JSON object of the form {{\"histo\": {{\"value\": count}}}}.")
    )]
    Malformed { descriptor: String, message: String },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("graph has not been populated")]
    #[diagnostic(
        code(kw::graph::not_populated),
        help("Call `populate_all` before matching or building a dual graph.")
    )]
    NotPopulated,

    #[error("node not found: \"{id}\"")]
    #[diagnostic(
        code(kw::graph::node_not_found),
        help("The node is not part of the ontology graph built for this root.")
    )]
    NodeNotFound { id: String },

    #[error("edge not found: {source_id} -> {target}")]
    #[diagnostic(
        code(kw::graph::edge_not_found),
        help("The edge is not part of the ontology graph built for this root.")
    )]
    EdgeNotFound { source_id: String, target: String },

    #[error("population failed")]
    #[diagnostic(
        code(kw::graph::population),
        help("A leaf lexicon could not be loaded, so the whole graph is unusable.")
    )]
    Population {
        #[source]
        #[diagnostic_source]
        source: VocabLoadError,
    },
}

// ---------------------------------------------------------------------------
// Steiner solver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SolveError {
    #[error("no interpretation found: {} unreachable from root \"{root}\"", .unreachable.join(", "))]
    #[diagnostic(
        code(kw::solve::impossible_graph),
        help(
            "No tree rooted at this node can reach every matched element. \
             Try a different root, or remove the terms that matched these elements."
        )
    )]
    ImpossibleGraph {
        root: String,
        unreachable: Vec<String>,
    },

    #[error("root \"{root}\" is not part of the dual graph")]
    #[diagnostic(
        code(kw::solve::missing_root),
        help("Build the dual graph from the same root that is passed to the solver.")
    )]
    MissingRoot { root: String },
}

// ---------------------------------------------------------------------------
// External backend errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum BackendError {
    #[error("backend \"{backend}\" unavailable: {message}")]
    #[diagnostic(
        code(kw::backend::unavailable),
        help("The pass using this backend is skipped; the query continues with fewer candidates.")
    )]
    Unavailable { backend: String, message: String },

    #[error("backend \"{backend}\" timed out after {millis} ms")]
    #[diagnostic(
        code(kw::backend::timeout),
        help("Raise `resolver.backend_timeout_ms` or disable the slow backend.")
    )]
    Timeout { backend: String, millis: u64 },

    #[error("HTTP request to {url} failed: {message}")]
    #[diagnostic(
        code(kw::backend::http),
        help("Check the endpoint template and that the service is reachable.")
    )]
    Http { url: String, message: String },

    #[error("failed to read backend data: {path}")]
    #[diagnostic(code(kw::backend::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse backend data from {origin}: {message}")]
    #[diagnostic(
        code(kw::backend::parse),
        help("The backend returned data in an unexpected format.")
    )]
    Parse { origin: String, message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(code(kw::config::read), help("Ensure the file exists and is readable."))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(kw::config::parse),
        help("Check the TOML syntax. Unknown keys are rejected.")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(kw::config::invalid), help("{message}"))]
    Invalid { message: String },
}

/// Convenience alias for functions returning kwgraph results.
pub type KwResult<T> = std::result::Result<T, KwError>;
