//! Predicate expression trees
//!
//! Filters and keyset predicates are plain data: a tagged tree of
//! AND/OR nodes over column comparisons. Query sources interpret the
//! tree themselves (in-memory evaluation, SQL rendering), so no
//! executable callbacks ever cross the collaborator boundary and the
//! builders stay independently testable.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};

// ============================================================================
// Comparison Operators
// ============================================================================

/// Comparison operator of a leaf predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// Equal: `=`
    Eq,
    /// Not equal: `!=`
    Ne,
    /// Greater than: `>`
    Gt,
    /// Greater than or equal: `>=`
    Gte,
    /// Less than: `<`
    Lt,
    /// Less than or equal: `<=`
    Lte,
}

impl CompareOp {
    /// SQL token for this operator
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

// ============================================================================
// Column References
// ============================================================================

/// A column reference, optionally wrapped with a comparison modifier.
///
/// Wrappers change how the column side of a comparison is resolved:
/// `Cast` compares under a dialect type cast, `TruncateTimestamp`
/// compares at millisecond precision (the precision cursor values
/// survive serialization at).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnExpr {
    /// Raw column reference
    Column(String),
    /// `CAST(inner AS type)`
    Cast(Box<ColumnExpr>, String),
    /// Truncate a datetime column to millisecond precision
    TruncateTimestamp(Box<ColumnExpr>),
}

impl ColumnExpr {
    /// Create a raw column reference
    pub fn column(name: impl Into<String>) -> Self {
        ColumnExpr::Column(name.into())
    }

    /// Wrap this reference in a type cast
    #[must_use]
    pub fn cast(self, ty: impl Into<String>) -> Self {
        ColumnExpr::Cast(Box::new(self), ty.into())
    }

    /// Wrap this reference in a millisecond truncation
    #[must_use]
    pub fn truncate_timestamp(self) -> Self {
        ColumnExpr::TruncateTimestamp(Box::new(self))
    }

    /// The innermost column name, through any wrappers
    pub fn name(&self) -> &str {
        match self {
            ColumnExpr::Column(name) => name,
            ColumnExpr::Cast(inner, _) | ColumnExpr::TruncateTimestamp(inner) => inner.name(),
        }
    }
}

impl From<&str> for ColumnExpr {
    fn from(name: &str) -> Self {
        ColumnExpr::Column(name.to_string())
    }
}

impl From<String> for ColumnExpr {
    fn from(name: String) -> Self {
        ColumnExpr::Column(name)
    }
}

// ============================================================================
// Expression Tree
// ============================================================================

/// A boolean predicate over rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// All child predicates must hold
    And(Vec<Expr>),
    /// At least one child predicate must hold
    Or(Vec<Expr>),
    /// Compare a column against a literal value
    Compare {
        column: ColumnExpr,
        op: CompareOp,
        value: JsonValue,
    },
}

impl Expr {
    /// Combine predicates with AND
    pub fn and(exprs: impl Into<Vec<Expr>>) -> Self {
        Expr::And(exprs.into())
    }

    /// Combine predicates with OR
    pub fn or(exprs: impl Into<Vec<Expr>>) -> Self {
        Expr::Or(exprs.into())
    }

    /// Compare an arbitrary column expression against a value
    pub fn compare(column: impl Into<ColumnExpr>, op: CompareOp, value: impl Into<JsonValue>) -> Self {
        Expr::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column = value`
    pub fn eq(column: impl Into<ColumnExpr>, value: impl Into<JsonValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// `column != value`
    pub fn ne(column: impl Into<ColumnExpr>, value: impl Into<JsonValue>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<ColumnExpr>, value: impl Into<JsonValue>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    /// `column >= value`
    pub fn gte(column: impl Into<ColumnExpr>, value: impl Into<JsonValue>) -> Self {
        Self::compare(column, CompareOp::Gte, value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<ColumnExpr>, value: impl Into<JsonValue>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    /// `column <= value`
    pub fn lte(column: impl Into<ColumnExpr>, value: impl Into<JsonValue>) -> Self {
        Self::compare(column, CompareOp::Lte, value)
    }
}
