//! In-memory query source
//!
//! Interprets query plans directly over a vector of JSON rows. This is
//! the reference semantics for the SQL renderer and the workhorse for
//! tests: the whole engine can be exercised without a database.

use crate::error::Result;
use crate::expr::{ColumnExpr, CompareOp, Expr};
use crate::keyset::truncate_timestamp_value;
use crate::source::{QueryPlan, QuerySource};
use crate::types::{JsonValue, Row, SortDirection};
use async_trait::async_trait;
use std::cmp::Ordering;

static NULL: JsonValue = JsonValue::Null;

/// Query source over an immutable in-memory row set
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<Row>,
}

impl MemorySource {
    /// Create a source over the given rows
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Create a source from JSON values, keeping only objects
    pub fn from_values(values: Vec<JsonValue>) -> Self {
        let total = values.len();
        let rows: Vec<Row> = values
            .into_iter()
            .filter_map(|value| match value {
                JsonValue::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        if rows.len() < total {
            tracing::warn!(dropped = total - rows.len(), "ignoring non-object values");
        }
        Self::new(rows)
    }

    /// Number of rows held
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the source holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl QuerySource for MemorySource {
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Row>> {
        let mut rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|row| {
                plan.filter.as_ref().map_or(true, |f| eval(f, row))
                    && plan.predicate.as_ref().map_or(true, |p| eval(p, row))
            })
            .cloned()
            .collect();

        if !plan.order_by.is_empty() {
            rows.sort_by(|a, b| {
                for term in &plan.order_by {
                    let lhs = a.get(&term.column).unwrap_or(&NULL);
                    let rhs = b.get(&term.column).unwrap_or(&NULL);
                    let ord = match term.direction {
                        SortDirection::Asc => compare_values(lhs, rhs),
                        SortDirection::Desc => compare_values(lhs, rhs).reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        if let Some(limit) = plan.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn count(&self, filter: Option<&Expr>) -> Result<u64> {
        let count = self
            .rows
            .iter()
            .filter(|row| filter.map_or(true, |f| eval(f, row)))
            .count();
        Ok(count as u64)
    }
}

// ============================================================================
// Expression Evaluation
// ============================================================================

/// Evaluate a predicate tree against one row
pub fn eval(expr: &Expr, row: &Row) -> bool {
    match expr {
        Expr::And(children) => children.iter().all(|child| eval(child, row)),
        Expr::Or(children) => children.iter().any(|child| eval(child, row)),
        Expr::Compare { column, op, value } => {
            let lhs = resolve_column(column, row);
            matches_op(compare_values(&lhs, value), *op)
        }
    }
}

/// Resolve the column side of a comparison against a row.
///
/// Casts are a dialect concern; in-memory values are already
/// dynamically typed, so the cast wrapper resolves to the inner
/// reference. Timestamp truncation applies for real, matching the
/// value-side truncation the keyset builder performs.
fn resolve_column(column: &ColumnExpr, row: &Row) -> JsonValue {
    match column {
        ColumnExpr::Column(name) => row.get(name).cloned().unwrap_or(JsonValue::Null),
        ColumnExpr::Cast(inner, _) => resolve_column(inner, row),
        ColumnExpr::TruncateTimestamp(inner) => {
            truncate_timestamp_value(&resolve_column(inner, row))
        }
    }
}

fn matches_op(ord: Ordering, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Gte => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Lte => ord != Ordering::Greater,
    }
}

/// Total order over JSON scalars: null < bool < number < string, with
/// numbers compared numerically across integer and float forms.
/// Arrays and objects fall back to their serialized text so the order
/// stays total and sorting stays deterministic.
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)).then_with(|| {
            // Same rank but different shapes: arrays/objects.
            a.to_string().cmp(&b.to_string())
        }),
    }
}

fn rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderTerm;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn source() -> MemorySource {
        MemorySource::from_values(vec![
            json!({"id": 1, "status": "active", "score": 10.5}),
            json!({"id": 2, "status": "inactive", "score": 3.0}),
            json!({"id": 3, "status": "active", "score": 7.0}),
            json!({"id": 4, "status": "active", "score": null}),
        ])
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_fetch_unfiltered_with_order() {
        let rows = source()
            .fetch(&QueryPlan::new().with_order_by(vec![OrderTerm::desc("id")]))
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_fetch_filter_and_predicate_both_apply() {
        let plan = QueryPlan::new()
            .with_filter(Expr::eq("status", json!("active")))
            .with_predicate(Expr::gt("id", 1))
            .with_order_by(vec![OrderTerm::asc("id")]);

        let rows = source().fetch(&plan).await.unwrap();
        assert_eq!(ids(&rows), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_fetch_limit() {
        let plan = QueryPlan::new()
            .with_order_by(vec![OrderTerm::asc("id")])
            .with_limit(2);
        let rows = source().fetch(&plan).await.unwrap();
        assert_eq!(ids(&rows), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_multi_column_sort_with_nulls_first() {
        let plan = QueryPlan::new().with_order_by(vec![
            OrderTerm::asc("score"),
            OrderTerm::asc("id"),
        ]);
        let rows = source().fetch(&plan).await.unwrap();
        // null sorts lowest, then numeric ascending.
        assert_eq!(ids(&rows), vec![4, 2, 3, 1]);
    }

    #[tokio::test]
    async fn test_count_with_and_without_filter() {
        let source = source();
        assert_eq!(source.count(None).await.unwrap(), 4);
        assert_eq!(
            source
                .count(Some(&Expr::eq("status", json!("active"))))
                .await
                .unwrap(),
            3
        );
    }

    #[test_case(CompareOp::Eq, 7, true ; "eq hit")]
    #[test_case(CompareOp::Ne, 9, true ; "ne hit")]
    #[test_case(CompareOp::Gt, 5, true ; "gt hit")]
    #[test_case(CompareOp::Gt, 7, false ; "gt boundary miss")]
    #[test_case(CompareOp::Gte, 7, true ; "gte boundary hit")]
    #[test_case(CompareOp::Lt, 9, true ; "lt hit")]
    #[test_case(CompareOp::Lte, 6, false ; "lte miss")]
    fn test_compare_ops(op: CompareOp, rhs: i64, expected: bool) {
        let row: Row = json!({"n": 7})
            .as_object()
            .cloned()
            .unwrap();
        let expr = Expr::compare("n", op, rhs);
        assert_eq!(eval(&expr, &row), expected);
    }

    #[test]
    fn test_and_or_nesting() {
        let row: Row = json!({"a": 1, "b": 2}).as_object().cloned().unwrap();

        let tree = Expr::or(vec![
            Expr::gt("a", 5),
            Expr::and(vec![Expr::eq("a", 1), Expr::gt("b", 1)]),
        ]);
        assert!(eval(&tree, &row));

        let tree = Expr::or(vec![
            Expr::gt("a", 5),
            Expr::and(vec![Expr::eq("a", 1), Expr::gt("b", 2)]),
        ]);
        assert!(!eval(&tree, &row));
    }

    #[test]
    fn test_truncate_wrapper_matches_millisecond_cursor() {
        // The stored value carries microseconds; the cursor value was
        // truncated to milliseconds. Equality must still hold.
        let row: Row = json!({"created_at": "2024-03-01T12:00:00.123456Z"})
            .as_object()
            .cloned()
            .unwrap();

        let without_wrap = Expr::eq("created_at", json!("2024-03-01T12:00:00.123Z"));
        assert!(!eval(&without_wrap, &row));

        let with_wrap = Expr::compare(
            ColumnExpr::column("created_at").truncate_timestamp(),
            CompareOp::Eq,
            json!("2024-03-01T12:00:00.123Z"),
        );
        assert!(eval(&with_wrap, &row));
    }

    #[test]
    fn test_cast_wrapper_resolves_inner_column() {
        let row: Row = json!({"tag": "rust"}).as_object().cloned().unwrap();
        let expr = Expr::compare(
            ColumnExpr::column("tag").cast("citext"),
            CompareOp::Eq,
            json!("rust"),
        );
        assert!(eval(&expr, &row));
    }

    #[test]
    fn test_numeric_cross_type_comparison() {
        assert_eq!(compare_values(&json!(2), &json!(2.0)), Ordering::Equal);
        assert_eq!(compare_values(&json!(2), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_values(&json!(3), &json!(2.5)), Ordering::Greater);
    }

    #[test]
    fn test_value_rank_ordering() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!(0)), Ordering::Less);
        assert_eq!(compare_values(&json!(99), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
    }

    #[test]
    fn test_missing_column_reads_null() {
        let row: Row = json!({"id": 1}).as_object().cloned().unwrap();
        assert!(eval(&Expr::eq("missing", json!(null)), &row));
        assert!(eval(&Expr::lt("missing", 0), &row));
    }

    #[test]
    fn test_from_values_keeps_objects_only() {
        let source = MemorySource::from_values(vec![json!({"id": 1}), json!(42), json!("x")]);
        assert_eq!(source.len(), 1);
        assert!(!source.is_empty());
    }
}
