//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keyset pagination toolkit CLI
#[derive(Parser, Debug)]
#[command(name = "keyseek")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Sort-key registry file (YAML)
    #[arg(short, long, global = true)]
    pub registry: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a sort-key registry file
    Validate,

    /// List registered sort keys and their columns
    Keys,

    /// Decode a cursor token into its JSON tuple
    DecodeCursor {
        /// Cursor token
        token: String,

        /// Arity-check the tuple against this registered sort key
        #[arg(long)]
        sort_key: Option<String>,
    },

    /// Run a page query against a SQLite database
    Page {
        /// SQLite database file
        #[arg(short, long)]
        database: PathBuf,

        /// Table to page over
        #[arg(short, long)]
        table: String,

        /// Primary-key column, used by the total-count query
        #[arg(long, default_value = "id")]
        primary_key: String,

        /// Sort key to page with (registry default when omitted)
        #[arg(long)]
        sort_key: Option<String>,

        /// Take the first N rows
        #[arg(long)]
        first: Option<i64>,

        /// Take the last N rows, paging backward
        #[arg(long)]
        last: Option<i64>,

        /// Return rows after this cursor
        #[arg(long)]
        after: Option<String>,

        /// Return rows before this cursor, paging backward
        #[arg(long)]
        before: Option<String>,

        /// Filter as a JSON expression tree
        #[arg(long)]
        filter: Option<String>,
    },

    /// Run the total-count query against a SQLite database
    Count {
        /// SQLite database file
        #[arg(short, long)]
        database: PathBuf,

        /// Table to count
        #[arg(short, long)]
        table: String,

        /// Primary-key column to count
        #[arg(long, default_value = "id")]
        primary_key: String,

        /// Filter as a JSON expression tree
        #[arg(long)]
        filter: Option<String>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON document
    Json,
    /// One JSON object per row
    Jsonl,
    /// Aligned columns for human reading
    Table,
}
