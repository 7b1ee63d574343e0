//! Pagination engine
//!
//! Orchestration of a page request from validation to edges.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PageEngine` - Resolves, validates, and runs page requests
//! - `PageRequest` / `Page` / `Edge` - Request and result shapes
//! - `LazyConnection` / `Connection` - Relay-style connection surface
//!
//! A request is validated before any I/O: sort-key resolution, limit
//! bounds, and cursor decoding all happen up front, so a malformed
//! request never reaches the query source.

mod types;

pub use types::{Connection, Edge, EngineConfig, Page, PageInfo, PageRequest};

use crate::cursor;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::keyset::{self, KeysetQuery};
use crate::sortkey::{SortKeyRegistry, SortKeySpec};
use crate::source::{QueryPlan, QuerySource};
use futures::stream::{self, Stream};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Pagination engine over a query source
pub struct PageEngine<S: QuerySource> {
    /// Registered sort keys
    registry: Arc<SortKeyRegistry>,
    /// Query collaborator
    source: Arc<S>,
    /// Limit configuration
    config: EngineConfig,
}

impl<S: QuerySource> Clone for PageEngine<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            source: Arc::clone(&self.source),
            config: self.config.clone(),
        }
    }
}

/// A validated request, ready to run
struct PreparedPage {
    /// Resolved sort key
    spec: Arc<SortKeySpec>,
    /// Plan handed to the query source
    plan: QueryPlan,
    /// Requested page size, before over-fetch
    limit: usize,
    /// Whether the request pages backward
    is_backward: bool,
    /// Whether fetched rows arrive in inverted order and need
    /// re-reversing into forward orientation
    reversed: bool,
    /// Whether the request carried a cursor
    cursor_present: bool,
}

impl<S: QuerySource> PageEngine<S> {
    /// Create a new engine
    pub fn new(registry: Arc<SortKeyRegistry>, source: Arc<S>) -> Self {
        Self {
            registry,
            source,
            config: EngineConfig::default(),
        }
    }

    /// Set the limit configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the sort key registry
    pub fn registry(&self) -> &SortKeyRegistry {
        &self.registry
    }

    /// Get the limit configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a request and assemble its query plan. No I/O happens
    /// here; every request error surfaces before the source is touched.
    fn prepare(&self, request: &PageRequest) -> Result<PreparedPage> {
        let spec = self.registry.resolve(request.sort_key.as_deref())?;
        let is_backward = request.is_backward();

        let limit = match request.first.or(request.last) {
            None => self.config.default_limit,
            Some(requested) => {
                if requested < 0 {
                    return Err(Error::negative_limit(requested));
                }
                let max = i64::try_from(self.config.max_limit).unwrap_or(i64::MAX);
                if self.config.max_limit > 0 && requested > max {
                    return Err(Error::limit_exceeds_max(requested, max));
                }
                usize::try_from(requested).unwrap_or(self.config.max_limit)
            }
        };

        let token = request.cursor_token();
        let tuple = match token {
            Some(token) => cursor::decode(token, &spec)?,
            None => Vec::new(),
        };

        let KeysetQuery {
            predicate,
            order_by,
        } = keyset::build(&spec, &tuple, is_backward)?;

        let fetch_limit = limit + usize::from(request.over_fetch);
        let mut plan = QueryPlan::new()
            .with_order_by(order_by)
            .with_limit(fetch_limit);
        if let Some(filter) = &request.filter {
            plan = plan.with_filter(filter.clone());
        }
        if let Some(predicate) = predicate {
            plan = plan.with_predicate(predicate);
        }

        tracing::trace!(plan = ?plan, "assembled query plan");

        Ok(PreparedPage {
            reversed: keyset::ordering_inverted(&spec, is_backward),
            cursor_present: token.is_some(),
            spec,
            plan,
            limit,
            is_backward,
        })
    }

    /// Run a prepared request: fetch limit+1, detect `has_more`, slice,
    /// restore forward orientation, and wrap rows into edges
    async fn run_page(&self, prepared: &PreparedPage) -> Result<Page> {
        tracing::debug!(
            sort_key = %prepared.spec.name,
            limit = prepared.limit,
            backward = prepared.is_backward,
            "running page query"
        );

        let mut rows = self.source.fetch(&prepared.plan).await?;

        let has_more = rows.len() > prepared.limit;
        rows.truncate(prepared.limit);
        if prepared.reversed {
            rows.reverse();
        }

        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            let cursor = cursor::encode(&row, &prepared.spec)?;
            edges.push(Edge { cursor, node: row });
        }

        Ok(Page { edges, has_more })
    }

    /// Fetch one page of edges
    pub async fn get_page(&self, request: &PageRequest) -> Result<Page> {
        let prepared = self.prepare(request)?;
        self.run_page(&prepared).await
    }

    /// Build a lazy connection. Validation runs now; the page query
    /// itself runs at most once, on first accessor use.
    pub fn get_lazy_connection(&self, request: &PageRequest) -> Result<LazyConnection<S>> {
        let prepared = self.prepare(request)?;
        Ok(LazyConnection {
            engine: self.clone(),
            prepared,
            page: OnceCell::new(),
        })
    }

    /// Build a fully-computed connection
    pub async fn get_connection(&self, request: &PageRequest) -> Result<Connection> {
        let prepared = self.prepare(request)?;
        let page = self.run_page(&prepared).await?;
        let total_count = self.total_count(prepared.plan.filter.as_ref()).await?;

        Ok(Connection {
            page_info: PageInfo {
                has_previous_page: prepared.cursor_present,
                has_next_page: page.has_more,
                start_cursor: page.start_cursor().map(String::from),
                end_cursor: page.end_cursor().map(String::from),
            },
            total_count,
            edges: page.edges,
        })
    }

    /// Count all rows under `filter`, ignoring pagination
    pub async fn total_count(&self, filter: Option<&Expr>) -> Result<u64> {
        self.source.count(filter).await
    }

    /// Walk forward through every page, feeding each end cursor back as
    /// `after`. Backward requests are rejected up front.
    pub fn page_stream(
        &self,
        request: PageRequest,
    ) -> Result<impl Stream<Item = Result<Page>> + Send> {
        if request.is_backward() {
            return Err(Error::config(
                "page streams only walk forward; use first/after",
            ));
        }

        let engine = self.clone();
        Ok(stream::unfold(Some(request), move |state| {
            let engine = engine.clone();
            async move {
                let request = state?;
                match engine.get_page(&request).await {
                    Ok(page) => {
                        let next = if page.has_more {
                            page.end_cursor()
                                .map(|cursor| request.clone().with_after(cursor))
                        } else {
                            None
                        };
                        Some((Ok(page), next))
                    }
                    Err(e) => Some((Err(e), None)),
                }
            }
        }))
    }
}

/// A connection whose page query runs at most once, on demand
///
/// `edges`, `has_next_page`, `start_cursor`, and `end_cursor` share one
/// memoized query execution. `total_count` issues a fresh count query
/// on every call. `has_previous_page` needs no query at all.
pub struct LazyConnection<S: QuerySource> {
    /// Engine that built this connection
    engine: PageEngine<S>,
    /// Validated request
    prepared: PreparedPage,
    /// Memoized page result
    page: OnceCell<Page>,
}

impl<S: QuerySource> LazyConnection<S> {
    /// The memoized page, running the query on first use
    async fn page(&self) -> Result<&Page> {
        self.page
            .get_or_try_init(|| self.engine.run_page(&self.prepared))
            .await
    }

    /// Edges in forward orientation
    pub async fn edges(&self) -> Result<&[Edge]> {
        Ok(&self.page().await?.edges)
    }

    /// Whether another page exists past this one
    pub async fn has_next_page(&self) -> Result<bool> {
        Ok(self.page().await?.has_more)
    }

    /// Whether the request resumed from a cursor (heuristic, not a count)
    pub fn has_previous_page(&self) -> bool {
        self.prepared.cursor_present
    }

    /// Cursor of the first edge
    pub async fn start_cursor(&self) -> Result<Option<String>> {
        Ok(self.page().await?.start_cursor().map(String::from))
    }

    /// Cursor of the last edge
    pub async fn end_cursor(&self) -> Result<Option<String>> {
        Ok(self.page().await?.end_cursor().map(String::from))
    }

    /// Total row count under the request filter, counted fresh on
    /// every call
    pub async fn total_count(&self) -> Result<u64> {
        self.engine
            .total_count(self.prepared.plan.filter.as_ref())
            .await
    }

    /// Await every accessor into a plain connection
    pub async fn into_connection(self) -> Result<Connection> {
        let total_count = self.total_count().await?;
        let page = self.page().await?;

        Ok(Connection {
            page_info: PageInfo {
                has_previous_page: self.has_previous_page(),
                has_next_page: page.has_more,
                start_cursor: page.start_cursor().map(String::from),
                end_cursor: page.end_cursor().map(String::from),
            },
            total_count,
            edges: page.edges.clone(),
        })
    }
}
