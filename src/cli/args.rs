//! Command-line surface: `init`, `sync`, `watch`, `serve`, `query` (spec
//! §4.16), grounded on the teacher's `clap` derive layout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Incremental code-graph indexing and query engine for JS/TS projects.
#[derive(Parser)]
#[command(
    name = "codetrace",
    version = env!("CARGO_PKG_VERSION"),
    about = "Incremental code-graph indexing and query engine",
    long_about = "Index a JS/TS workspace into a property graph, keep it in sync with the \
                  working tree, and answer dependency/dependent/path queries over it.",
    next_line_help = true
)]
pub struct Cli {
    /// Path to the workspace root. Defaults to the current directory.
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable debug-level logging regardless of `settings.toml`.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create `.codetrace/` and a default `settings.toml` in the workspace.
    #[command(about = "Set up the .codetrace cache directory and default configuration")]
    Init {
        /// Overwrite an existing settings.toml.
        #[arg(short, long)]
        force: bool,
    },

    /// Run one reconciliation pass against the manifest and exit.
    #[command(about = "Diff the working tree against the manifest and reindex what changed")]
    Sync,

    /// Run sync, then watch the tree until interrupted.
    #[command(about = "Sync once, then keep the graph up to date as files change")]
    Watch,

    /// Run watch, plus the MCP stdio query server.
    #[command(about = "Run the watcher and serve the query tools over MCP stdio")]
    Serve,

    /// Run a single query against the current graph, without starting the
    /// watcher or server.
    #[command(subcommand, about = "Run an ad-hoc dependenciesOf/dependentsOf/pathsBetween query")]
    Query(QueryCommand),
}

#[derive(Subcommand)]
pub enum QueryCommand {
    /// List what a symbol calls, references, extends, implements, or uses.
    DependenciesOf {
        /// File path, relative to the workspace root.
        file_path: String,
        /// Symbol name within that file.
        symbol: String,
        /// Prune to branches relevant to this free-text topic.
        #[arg(long)]
        topic: Option<String>,
    },

    /// List what calls, references, extends, implements, or uses a symbol.
    DependentsOf {
        file_path: String,
        symbol: String,
        #[arg(long)]
        topic: Option<String>,
    },

    /// Find the shortest dependency path between two symbols.
    PathsBetween {
        /// File path of the source symbol.
        from_file: String,
        /// Name of the source symbol.
        from_symbol: String,
        /// File path of the target symbol.
        to_file: String,
        /// Name of the target symbol.
        to_symbol: String,
    },
}
