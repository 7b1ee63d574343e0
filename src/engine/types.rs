//! Engine types
//!
//! Request, page, and connection shapes for the pagination engine.

use crate::expr::Expr;
use crate::types::Row;
use serde::{Deserialize, Serialize};

/// Engine limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Page size applied when a request carries neither `first` nor `last`
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Upper bound on any requested page size (0 = unbounded)
    #[serde(default = "max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    10
}

fn max_limit() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: max_limit(),
        }
    }
}

impl EngineConfig {
    /// Create a new engine config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default page size
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the maximum page size
    #[must_use]
    pub fn with_max_limit(mut self, max: usize) -> Self {
        self.max_limit = max;
        self
    }
}

/// A single page request
///
/// Forward requests carry `first`/`after`, backward requests carry
/// `last`/`before`. A request with neither cursor nor size pages
/// forward from the start at the configured default size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Registered sort key name; the registry default applies when unset
    pub sort_key: Option<String>,
    /// Forward page size
    pub first: Option<i64>,
    /// Backward page size
    pub last: Option<i64>,
    /// Start after this cursor (forward)
    pub after: Option<String>,
    /// End before this cursor (backward)
    pub before: Option<String>,
    /// Extra row filter applied alongside the keyset predicate
    pub filter: Option<Expr>,
    /// Fetch one extra row to detect whether more pages exist
    #[serde(default = "over_fetch_default")]
    pub over_fetch: bool,
}

fn over_fetch_default() -> bool {
    true
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            sort_key: None,
            first: None,
            last: None,
            after: None,
            before: None,
            filter: None,
            over_fetch: true,
        }
    }
}

impl PageRequest {
    /// Create a new page request
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort key name
    #[must_use]
    pub fn with_sort_key(mut self, name: impl Into<String>) -> Self {
        self.sort_key = Some(name.into());
        self
    }

    /// Page forward by `first` rows
    #[must_use]
    pub fn with_first(mut self, first: i64) -> Self {
        self.first = Some(first);
        self
    }

    /// Page backward by `last` rows
    #[must_use]
    pub fn with_last(mut self, last: i64) -> Self {
        self.last = Some(last);
        self
    }

    /// Resume after this cursor
    #[must_use]
    pub fn with_after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Resume before this cursor
    #[must_use]
    pub fn with_before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    /// Set the extra row filter
    #[must_use]
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Enable or disable over-fetch detection
    #[must_use]
    pub fn with_over_fetch(mut self, over_fetch: bool) -> Self {
        self.over_fetch = over_fetch;
        self
    }

    /// Whether this request pages backward
    pub fn is_backward(&self) -> bool {
        self.last.is_some() || self.before.is_some()
    }

    /// The cursor this request resumes from. `before` wins when both
    /// cursors are set.
    pub fn cursor_token(&self) -> Option<&str> {
        self.before.as_deref().or(self.after.as_deref())
    }
}

/// A row paired with its cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Opaque cursor encoding this row's sort-key tuple
    pub cursor: String,
    /// The row itself
    pub node: Row,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Edges in forward orientation
    pub edges: Vec<Edge>,
    /// Whether another page exists past this one
    pub has_more: bool,
}

impl Page {
    /// Cursor of the first edge
    pub fn start_cursor(&self) -> Option<&str> {
        self.edges.first().map(|edge| edge.cursor.as_str())
    }

    /// Cursor of the last edge
    pub fn end_cursor(&self) -> Option<&str> {
        self.edges.last().map(|edge| edge.cursor.as_str())
    }

    /// Iterate over the rows without their cursors
    pub fn nodes(&self) -> impl Iterator<Item = &Row> {
        self.edges.iter().map(|edge| &edge.node)
    }

    /// Whether the page holds no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Relay-style page info
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether the request resumed from a cursor (heuristic, not a count)
    pub has_previous_page: bool,
    /// Whether another page exists past this one
    pub has_next_page: bool,
    /// Cursor of the first edge
    pub start_cursor: Option<String>,
    /// Cursor of the last edge
    pub end_cursor: Option<String>,
}

/// Relay-style connection with all fields computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Edges in forward orientation
    pub edges: Vec<Edge>,
    /// Page info
    pub page_info: PageInfo,
    /// Total row count under the request filter, ignoring pagination
    pub total_count: u64,
}
