//! Query source seam
//!
//! The engine never talks to a store directly. It assembles a
//! [`QueryPlan`] (caller filter, keyset predicate, ordering, limit) and
//! hands it to a [`QuerySource`], which interprets the plan however it
//! likes. Two interpreters ship with the crate: [`MemorySource`]
//! evaluates plans over JSON rows, [`SqliteSource`] renders them to SQL
//! and executes over an embedded database.

mod memory;
mod sqlite;

pub use memory::MemorySource;
pub use sqlite::SqliteSource;

use crate::error::Result;
use crate::expr::Expr;
use crate::types::{OrderTerm, Row};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Query Plan
// ============================================================================

/// A fully-described page fetch: what to select, in what order, how many
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Caller-supplied row filter
    pub filter: Option<Expr>,
    /// Keyset boundary predicate, present only when paging from a cursor
    pub predicate: Option<Expr>,
    /// ORDER BY terms, outermost first
    pub order_by: Vec<OrderTerm>,
    /// Maximum number of rows to return
    pub limit: Option<usize>,
}

impl QueryPlan {
    /// An empty plan: no filter, no ordering, no limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the caller filter
    #[must_use]
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the keyset boundary predicate
    #[must_use]
    pub fn with_predicate(mut self, predicate: Expr) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Set the ORDER BY terms
    #[must_use]
    pub fn with_order_by(mut self, order_by: Vec<OrderTerm>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Set the row limit
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter and predicate joined under one AND, for interpreters that
    /// want a single tree
    pub fn combined_predicate(&self) -> Option<Expr> {
        match (&self.filter, &self.predicate) {
            (Some(filter), Some(predicate)) => {
                Some(Expr::and(vec![filter.clone(), predicate.clone()]))
            }
            (Some(filter), None) => Some(filter.clone()),
            (None, Some(predicate)) => Some(predicate.clone()),
            (None, None) => None,
        }
    }
}

// ============================================================================
// Query Source Trait
// ============================================================================

/// Query collaborator the engine runs page and count queries through
#[async_trait]
pub trait QuerySource: Send + Sync {
    /// Execute the plan, returning rows in plan order
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Row>>;

    /// Count rows matching `filter`, ignoring ordering and limits
    async fn count(&self, filter: Option<&Expr>) -> Result<u64>;
}
