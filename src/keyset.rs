//! Keyset comparison tree construction
//!
//! Given a resolved sort key, a decoded cursor tuple, and the paging
//! direction, this module produces the two halves of a "next page"
//! query: the ORDER BY list under effective directions and the
//! recursive tie-break predicate selecting rows strictly after the
//! cursor position in the effective ordering:
//!
//! ```text
//! predicate(i) =
//!   if i == n: column(i) OP(i) v(i)
//!   else:      (column(i) OP(i) v(i))
//!              OR (column(i) = v(i) AND predicate(i + 1))
//! ```
//!
//! Paging backward inverts the direction, and with it the operator, of
//! every column marked reversible; non-reversible tie-breakers keep
//! their forward semantics regardless of paging direction.

use crate::error::{Error, Result};
use crate::expr::{ColumnExpr, CompareOp, Expr};
use crate::sortkey::{ColumnSpec, SortKeySpec, ValueKind};
use crate::types::{JsonValue, OrderTerm, SortDirection};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

// ============================================================================
// Keyset Query
// ============================================================================

/// The ordering and boundary predicate for one page fetch
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetQuery {
    /// Tie-break predicate; `None` when the request carried no cursor
    pub predicate: Option<Expr>,
    /// ORDER BY terms under effective directions, in spec order
    pub order_by: Vec<OrderTerm>,
}

/// Build the keyset query for `spec` at the position held in `cursor`.
///
/// An empty `cursor` means "from the start": no predicate, ordering
/// only. A non-empty cursor must match the spec arity; the engine
/// guarantees this by decoding through the codec, direct callers get
/// an `InvalidCursor` otherwise.
pub fn build(spec: &SortKeySpec, cursor: &[JsonValue], is_backward: bool) -> Result<KeysetQuery> {
    let order_by = spec
        .columns
        .iter()
        .map(|col| OrderTerm::new(&col.column, effective_direction(col, is_backward)))
        .collect();

    let predicate = if cursor.is_empty() {
        None
    } else {
        if cursor.len() != spec.arity() {
            return Err(Error::invalid_cursor(format!(
                "expected {} values, got {}",
                spec.arity(),
                cursor.len()
            )));
        }
        Some(tie_break(spec, cursor, is_backward, 0))
    };

    Ok(KeysetQuery {
        predicate,
        order_by,
    })
}

/// Direction column `col` is actually fetched in
pub fn effective_direction(col: &ColumnSpec, is_backward: bool) -> SortDirection {
    if is_backward && col.reversible {
        col.direction.invert()
    } else {
        col.direction
    }
}

/// Whether a backward fetch under `spec` runs in inverted order.
///
/// True only when at least one column flips; an all-non-reversible
/// spec fetches backward pages in forward order already.
pub fn ordering_inverted(spec: &SortKeySpec, is_backward: bool) -> bool {
    is_backward && spec.columns.iter().any(|col| col.reversible)
}

/// Operator pointing strictly past the cursor in `direction`
fn tie_break_op(direction: SortDirection) -> CompareOp {
    match direction {
        SortDirection::Asc => CompareOp::Gt,
        SortDirection::Desc => CompareOp::Lt,
    }
}

fn tie_break(spec: &SortKeySpec, cursor: &[JsonValue], is_backward: bool, index: usize) -> Expr {
    let col = &spec.columns[index];
    let column = column_expr(col);
    let value = cursor_value(col, &cursor[index]);
    let op = tie_break_op(effective_direction(col, is_backward));
    let strictly_after = Expr::compare(column.clone(), op, value.clone());

    if index + 1 == spec.columns.len() {
        return strictly_after;
    }

    Expr::or(vec![
        strictly_after,
        Expr::and(vec![
            Expr::compare(column, CompareOp::Eq, value),
            tie_break(spec, cursor, is_backward, index + 1),
        ]),
    ])
}

/// Column side of a comparison, wrapped per the column's value kind
fn column_expr(col: &ColumnSpec) -> ColumnExpr {
    let base = ColumnExpr::column(&col.column);
    match &col.value_kind {
        ValueKind::Plain => base,
        ValueKind::Timestamp => base.truncate_timestamp(),
        ValueKind::Cast(ty) => base.cast(ty),
    }
}

/// Value side of a comparison, truncated for timestamp columns
fn cursor_value(col: &ColumnSpec, value: &JsonValue) -> JsonValue {
    match col.value_kind {
        ValueKind::Timestamp => truncate_timestamp_value(value),
        _ => value.clone(),
    }
}

/// Truncate an RFC 3339 string to millisecond precision, normalized to
/// UTC. Values that are not parseable datetimes pass through unchanged
/// (integer epochs are already millisecond-exact).
pub fn truncate_timestamp_value(value: &JsonValue) -> JsonValue {
    let Some(text) = value.as_str() else {
        return value.clone();
    };

    match DateTime::parse_from_rfc3339(text) {
        Ok(parsed) => {
            let truncated = parsed.with_timezone(&Utc).trunc_subsecs(3);
            JsonValue::String(truncated.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Err(_) => value.clone(),
    }
}
