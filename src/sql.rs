//! SQL rendering for query plans
//!
//! Turns a [`QueryPlan`] into a parameterized SQL string. Rendering is
//! dialect-aware where the supported dialects disagree: parameter
//! placeholders and the millisecond-truncation expression for
//! timestamp comparisons. Only the SQLite rendering is executed inside
//! this crate; the Postgres rendering exists for callers bringing
//! their own executor.

use crate::expr::{ColumnExpr, CompareOp, Expr};
use crate::source::QueryPlan;
use crate::types::JsonValue;

// ============================================================================
// Dialects
// ============================================================================

/// Target SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Parameter placeholder for the 1-based index `idx`
    fn placeholder(self, idx: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{idx}"),
            Dialect::Postgres => format!("${idx}"),
        }
    }

    /// Millisecond truncation over an already-rendered column
    /// expression, normalized to the same canonical UTC text form the
    /// keyset builder produces for cursor values.
    ///
    /// SQLite's date parser rounds to the nearest millisecond, so a
    /// stored value within half a millisecond of the next boundary
    /// renders one millisecond above the truncated cursor value.
    /// Postgres `date_trunc` floors. Sub-millisecond storage is only
    /// exact on the Postgres rendering.
    fn truncate_timestamp(self, inner: &str) -> String {
        match self {
            Dialect::Sqlite => format!("strftime('%Y-%m-%dT%H:%M:%fZ', {inner})"),
            Dialect::Postgres => format!("date_trunc('milliseconds', {inner})"),
        }
    }
}

/// Quote an identifier, escaping embedded quotes
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// ============================================================================
// Rendering
// ============================================================================

/// A rendered SQL statement and its bind parameters, in placeholder order
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a rendered query does nothing until executed"]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<JsonValue>,
}

/// Render a page-fetch plan as `SELECT * FROM table ...`
pub fn render_select(table: &str, plan: &QueryPlan, dialect: Dialect) -> RenderedQuery {
    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    let mut params = Vec::new();

    if let Some(predicate) = plan.combined_predicate() {
        sql.push_str(" WHERE ");
        render_expr(&predicate, dialect, &mut sql, &mut params);
    }

    if !plan.order_by.is_empty() {
        let terms: Vec<String> = plan
            .order_by
            .iter()
            .map(|term| format!("{} {}", quote_ident(&term.column), term.direction.as_sql()))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
    }

    if let Some(limit) = plan.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    RenderedQuery { sql, params }
}

/// Render the total-count query: the caller filter only, no ordering,
/// no limit, counting the primary identifier
pub fn render_count(
    table: &str,
    primary_key: &str,
    filter: Option<&Expr>,
    dialect: Dialect,
) -> RenderedQuery {
    let mut sql = format!(
        "SELECT count({}) AS total FROM {}",
        quote_ident(primary_key),
        quote_ident(table)
    );
    let mut params = Vec::new();

    if let Some(filter) = filter {
        sql.push_str(" WHERE ");
        render_expr(filter, dialect, &mut sql, &mut params);
    }

    RenderedQuery { sql, params }
}

fn render_expr(expr: &Expr, dialect: Dialect, sql: &mut String, params: &mut Vec<JsonValue>) {
    match expr {
        Expr::And(children) => render_children(children, " AND ", "1 = 1", dialect, sql, params),
        Expr::Or(children) => render_children(children, " OR ", "1 = 0", dialect, sql, params),
        Expr::Compare { column, op, value } => {
            sql.push_str(&render_column(column, dialect));
            // SQL three-valued logic: equality against NULL needs IS.
            if value.is_null() && matches!(op, CompareOp::Eq | CompareOp::Ne) {
                sql.push_str(match op {
                    CompareOp::Eq => " IS NULL",
                    _ => " IS NOT NULL",
                });
                return;
            }
            params.push(value.clone());
            sql.push_str(&format!(
                " {} {}",
                op.as_sql(),
                dialect.placeholder(params.len())
            ));
        }
    }
}

fn render_children(
    children: &[Expr],
    joiner: &str,
    empty: &str,
    dialect: Dialect,
    sql: &mut String,
    params: &mut Vec<JsonValue>,
) {
    if children.is_empty() {
        sql.push_str(empty);
        return;
    }

    sql.push('(');
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            sql.push_str(joiner);
        }
        render_expr(child, dialect, sql, params);
    }
    sql.push(')');
}

fn render_column(column: &ColumnExpr, dialect: Dialect) -> String {
    match column {
        ColumnExpr::Column(name) => quote_ident(name),
        ColumnExpr::Cast(inner, ty) => {
            format!("CAST({} AS {})", render_column(inner, dialect), ty)
        }
        ColumnExpr::TruncateTimestamp(inner) => {
            dialect.truncate_timestamp(&render_column(inner, dialect))
        }
    }
}
