//! kwgraph CLI: keyword query interpretation over an ontology schema.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use kwgraph::config::KwConfig;
use kwgraph::graph::traverse::{reachable_from, Reached};
use kwgraph::graph::{NodeKind, OntologyGraph};
use kwgraph::query::{generate_anchors, CandidateResolver};
use kwgraph::schema::SchemaDoc;
use kwgraph::session::QuerySession;
use kwgraph::vocab::HistogramStore;

#[derive(Parser)]
#[command(name = "kwgraph", version, about = "Keyword query interpretation over a typed schema graph")]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Schema file; overrides the configuration.
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Directory of leaf vocabulary histograms; overrides the configuration.
    #[arg(long, global = true)]
    vocab_dir: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret query terms as a minimal schema subgraph anchored at a root.
    Query {
        /// Root class the interpretation must start from.
        #[arg(long)]
        root: String,

        /// Print the interpretation as JSON.
        #[arg(long)]
        json: bool,

        /// Query terms, already tokenized.
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Show the unigram/bigram anchors generated for the terms.
    Anchors {
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// List every node and edge reachable from a root.
    Reach {
        #[arg(long)]
        root: String,
    },

    /// Summarise the graph built for a root.
    Schema {
        #[arg(long)]
        root: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => KwConfig::load(path)?,
        None => KwConfig::default(),
    };
    if cli.schema.is_some() {
        config.schema = cli.schema.clone();
    }
    if cli.vocab_dir.is_some() {
        config.vocab_dir = cli.vocab_dir.clone();
    }

    match cli.command {
        Commands::Query { root, json, terms } => {
            let graph = populated_graph(&config, &root)?;
            let mut resolver =
                CandidateResolver::new(&graph).with_config(config.resolver.clone());
            if let Some(source) = config.synonyms.build()? {
                resolver = resolver.with_synonyms(source);
            }

            let session = QuerySession::run(&resolver, &root, &terms)?;
            if json {
                let out =
                    serde_json::to_string_pretty(&session.interpretation()).into_diagnostic()?;
                println!("{out}");
            } else {
                println!("Anchors:");
                print!("{}", session.dump());
                println!(
                    "\nSteiner tree ({} vertices, weight {}):",
                    session.tree().nodes.len(),
                    session.tree().weight()
                );
                for (a, b) in &session.tree().edges {
                    println!("  {a} -- {b}");
                }
                println!("\nSubgraph rooted at \"{}\":", session.root());
                for id in &session.subgraph().nodes {
                    println!("  {id}");
                }
                for edge in &session.subgraph().edges {
                    println!("  {} -[{}]-> {}", edge.source, edge.relation, edge.target);
                }
            }
        }

        Commands::Anchors { terms } => {
            for anchor in generate_anchors(&terms) {
                let indent = if anchor.is_unigram() { "" } else { "  " };
                println!("{indent}{anchor} (words: {})", anchor.words.join(" "));
            }
        }

        Commands::Reach { root } => {
            let graph = schema_graph(&config, &root)?;
            for step in reachable_from(&graph, &root) {
                match step {
                    Reached::Node(node) => println!("node {}", node.id),
                    Reached::Edge(edge) => {
                        println!("  edge {} -[{}]-> {}", edge.source, edge.relation, edge.target)
                    }
                }
            }
        }

        Commands::Schema { root } => {
            let graph = schema_graph(&config, &root)?;
            println!("{} nodes, {} edges", graph.node_count(), graph.edge_count());
            for node in graph.nodes() {
                match &node.kind {
                    NodeKind::Class { class_name } => println!("  class {} ({class_name})", node.id),
                    NodeKind::Leaf { vocab } => println!("  leaf  {} <- {vocab}", node.id),
                }
            }
            for edge in graph.edges() {
                println!(
                    "  {:?} {} -[{}]-> {}",
                    edge.kind, edge.source, edge.relation, edge.target
                );
            }
        }
    }

    Ok(())
}

fn schema_graph(config: &KwConfig, root: &str) -> Result<OntologyGraph> {
    let doc: SchemaDoc = config.schema_doc()?;
    Ok(doc.build_graph(root)?)
}

fn populated_graph(config: &KwConfig, root: &str) -> Result<OntologyGraph> {
    let Some(dir) = &config.vocab_dir else {
        miette::bail!("no vocabulary directory: pass --vocab-dir or set vocab_dir in the config");
    };
    let mut graph = schema_graph(config, root)?;
    let store = HistogramStore::new(dir);
    graph.populate_all(&store)?;
    Ok(graph)
}
