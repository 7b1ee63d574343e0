//! CLI module
//!
//! Command-line interface for inspecting registries and paging SQLite
//! tables.
//!
//! # Commands
//!
//! - `validate` - Check a sort-key registry file
//! - `keys` - List registered sort keys and their columns
//! - `decode-cursor` - Print the JSON tuple behind a cursor token
//! - `page` - Run a page query against a SQLite database
//! - `count` - Run the total-count query

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
