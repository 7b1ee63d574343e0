// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Keyseek
//!
//! Keyset (cursor) pagination over pluggable query sources.
//!
//! ## Features
//!
//! - **Relay-style connections**: edges with opaque cursors, pageInfo,
//!   totalCount
//! - **Multi-column sort keys**: tie-broken keyset predicates instead of
//!   OFFSET scans, stable under concurrent writes
//! - **Backward paging**: reversible columns invert per request, pinned
//!   tie-breakers keep forward semantics
//! - **Lazy connections**: the page query runs once, on first accessor
//! - **Pluggable sources**: in-memory reference source and a SQLite
//!   executor behind one async seam
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keyseek::{ColumnSpec, MemorySource, PageEngine, PageRequest, SortKeyRegistry};
//!
//! #[tokio::main]
//! async fn main() -> keyseek::Result<()> {
//!     let registry = SortKeyRegistry::builder()
//!         .sort_key(
//!             "chrono",
//!             vec![
//!                 ColumnSpec::new("created_at").timestamp().reversible(),
//!                 ColumnSpec::new("id").reversible(),
//!             ],
//!         )
//!         .default_sort_key("chrono")
//!         .build()?;
//!
//!     let source = MemorySource::from_values(vec![
//!         serde_json::json!({ "id": 1, "created_at": "2024-01-01T00:00:00.000Z" }),
//!         serde_json::json!({ "id": 2, "created_at": "2024-01-02T00:00:00.000Z" }),
//!     ]);
//!     let engine = PageEngine::new(Arc::new(registry), Arc::new(source));
//!
//!     // First page, then follow the end cursor
//!     let page = engine.get_page(&PageRequest::new().with_first(10)).await?;
//!     if let Some(token) = page.end_cursor() {
//!         let next = PageRequest::new().with_first(10).with_after(token);
//!         let _ = engine.get_page(&next).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           PageEngine                            │
//! │  get_page() → Page          get_connection() → Connection       │
//! │  get_lazy_connection() → LazyConnection      page_stream()      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ sortkey  │  cursor   │    keyset     │    sql    │   source    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Registry │ base64    │ tie-break     │ SQLite    │ Memory      │
//! │ resolve  │ JSON tuple│ predicates    │ Postgres  │ SQLite      │
//! │ defaults │ arity     │ ORDER BY      │ params    │ QuerySource │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: document the remaining public fields

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Predicate expression trees
pub mod expr;

/// Sort-key specs and the registry
pub mod sortkey;

/// Cursor encoding and decoding
pub mod cursor;

/// Keyset predicate and ordering construction
pub mod keyset;

/// SQL rendering for query plans
pub mod sql;

/// YAML registry configuration
pub mod config;

/// Query sources (in-memory, SQLite)
pub mod source;

/// Page engine and connections
pub mod engine;

/// Global node identifiers
pub mod global_id;

/// Slug generation
pub mod slug;

/// Row touch timestamps
pub mod touch;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_registry, load_registry_from_str};
pub use engine::{Connection, Edge, EngineConfig, Page, PageEngine, PageInfo, PageRequest};
pub use expr::{ColumnExpr, CompareOp, Expr};
pub use sortkey::{ColumnSpec, SortKeyRegistry, SortKeySpec};
pub use source::{MemorySource, QuerySource, SqliteSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
