//! Versioner CLI: read an entity's version history from a graph database.
//!
//! Usage:
//!   versioner get <current-state|current-path|all> <entity> [--db path] [--config file]
//!   versioner get by-date <entity> <instant>
//!   versioner audit <entity>
//!   versioner import <graph.json>
//!
//! Results are printed to stdout as JSON. Exit status is 0 on success,
//! 1 on error, and 2 when the entity has no history to show.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use graph_versioner::config::DEFAULT_LOG_FILTER;
use graph_versioner::{
    GraphStore, NodeId, OpenStore, Procedure, PropertyValue, SqliteStore, Subgraph,
    VersionerApi, VersionerConfig,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const EXIT_ERROR: i32 = 1;
const EXIT_ABSENT: i32 = 2;

#[derive(Parser)]
#[command(
    name = "versioner",
    version,
    about = "Entity/state version history over a property graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to a YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one of the history procedures
    Get {
        #[command(subcommand)]
        procedure: GetProcedure,
    },
    /// Check an entity's history against the model invariants
    Audit {
        /// Entity node ID
        entity: String,
    },
    /// Load nodes and edges from a JSON document into the database
    Import {
        /// JSON file with `nodes` and `edges` arrays
        #[arg(required = true)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum GetProcedure {
    /// get.current.state
    CurrentState {
        /// Entity node ID
        entity: String,
    },
    /// get.current.path
    CurrentPath {
        /// Entity node ID
        entity: String,
    },
    /// get.all
    All {
        /// Entity node ID
        entity: String,
    },
    /// get.by.date
    ByDate {
        /// Entity node ID
        entity: String,
        /// Epoch milliseconds or an RFC 3339 timestamp
        instant: String,
    },
}

/// Parse a filter directive, falling back to the default on a bad one.
/// The second value describes the rejected directive.
fn build_filter(directive: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, None),
        Err(e) => (
            EnvFilter::new(DEFAULT_LOG_FILTER),
            Some(format!("invalid log filter '{}': {}", directive, e)),
        ),
    }
}

fn init_logging(config: &VersionerConfig) {
    let (filter, rejected) = build_filter(&config.log_filter());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    if let Some(reason) = rejected {
        tracing::warn!("{}, using '{}'", reason, DEFAULT_LOG_FILTER);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<VersionerConfig, String> {
    match path {
        Some(path) => VersionerConfig::load(path).map_err(|e| e.to_string()),
        None => Ok(VersionerConfig::default()),
    }
}

fn open_store(db: Option<PathBuf>, config: &VersionerConfig) -> Result<SqliteStore, String> {
    let db_path = db.unwrap_or_else(|| config.database_path());
    tracing::debug!(path = %db_path.display(), "opening database");
    SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

/// Accept the same instant forms the graph stores: epoch millis or RFC 3339
fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    let value = match raw.parse::<i64>() {
        Ok(millis) => PropertyValue::Int(millis),
        Err(_) => PropertyValue::from(raw),
    };
    value
        .as_instant()
        .ok_or_else(|| format!("invalid instant '{}': expected epoch millis or RFC 3339", raw))
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    }
}

fn cmd_get(api: &VersionerApi, procedure: GetProcedure) -> i32 {
    let (procedure, entity, at) = match procedure {
        GetProcedure::CurrentState { entity } => (Procedure::CurrentState, entity, None),
        GetProcedure::CurrentPath { entity } => (Procedure::CurrentPath, entity, None),
        GetProcedure::All { entity } => (Procedure::All, entity, None),
        GetProcedure::ByDate { entity, instant } => match parse_instant(&instant) {
            Ok(at) => (Procedure::ByDate, entity, Some(at)),
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_ERROR;
            }
        },
    };

    match api.call(procedure, &NodeId::from(entity.as_str()), at) {
        Ok(Some(row)) => print_json(&row),
        Ok(None) => {
            eprintln!("No result for '{}' from {}", entity, procedure);
            EXIT_ABSENT
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    }
}

fn cmd_audit(api: &VersionerApi, entity: &str) -> i32 {
    match api.audit(&NodeId::from(entity)) {
        Ok(Some(report)) => {
            let code = print_json(&report);
            if code == 0 && !report.is_consistent() {
                return EXIT_ERROR;
            }
            code
        }
        Ok(None) => {
            eprintln!("Entity '{}' has no history", entity);
            EXIT_ABSENT
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    }
}

fn cmd_import(store: &dyn GraphStore, file: &PathBuf) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return EXIT_ERROR;
        }
    };
    let subgraph: Subgraph = match serde_json::from_str(&text) {
        Ok(subgraph) => subgraph,
        Err(e) => {
            eprintln!("Error: invalid graph document '{}': {}", file.display(), e);
            return EXIT_ERROR;
        }
    };
    match subgraph.load_into(store) {
        Ok(()) => {
            println!(
                "Imported {} nodes and {} edges",
                subgraph.nodes.len(),
                subgraph.edges.len()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    };
    init_logging(&config);

    let store = match open_store(cli.db, &config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    };

    let code = match cli.command {
        Commands::Import { file } => cmd_import(store.as_ref(), &file),
        Commands::Get { procedure } => {
            let api = VersionerApi::new(store).with_not_found(config.not_found);
            cmd_get(&api, procedure)
        }
        Commands::Audit { entity } => {
            let api = VersionerApi::new(store).with_not_found(config.not_found);
            cmd_audit(&api, &entity)
        }
    };
    std::process::exit(code);
}
