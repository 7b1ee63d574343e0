//! Sort key specifications and their registry
//!
//! A sort key names an ordered list of columns that together define a
//! total row ordering. The column order is load-bearing twice over: it
//! is the ORDER BY order and the cursor tuple order. Registries are
//! built once at setup through a validating builder (or from YAML, see
//! `config`) and are immutable afterwards, so concurrent reads need no
//! synchronization.

use crate::error::{Error, Result};
use crate::types::{OptionStringExt, SortDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// Value Kinds
// ============================================================================

/// How a column participates in cursor comparisons
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Compare the raw column against the raw cursor value
    #[default]
    Plain,
    /// Datetime column: truncate both sides to millisecond precision.
    /// Stored values may carry finer precision than what survives a
    /// round-trip through the cursor encoding; comparing at the coarser
    /// precision avoids off-by-epsilon misses at page boundaries.
    Timestamp,
    /// Cast the column to the named type before comparing, for dialects
    /// where the default comparison does not match the backing index
    Cast(String),
}

// ============================================================================
// Column Spec
// ============================================================================

/// One column of a sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column identifier in the underlying store
    pub column: String,
    /// Forward sort direction
    #[serde(default)]
    pub direction: SortDirection,
    /// Whether direction and operator invert when paging backward.
    /// Tie-breakers that must keep their forward semantics on backward
    /// pages stay non-reversible.
    #[serde(default)]
    pub reversible: bool,
    /// Comparison modifier
    #[serde(default, rename = "kind")]
    pub value_kind: ValueKind,
}

impl ColumnSpec {
    /// Create an ascending, non-reversible, plain column
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
            reversible: false,
            value_kind: ValueKind::Plain,
        }
    }

    /// Set the forward sort direction
    #[must_use]
    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sort this column descending
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.direction = SortDirection::Desc;
        self
    }

    /// Invert this column's direction and operator on backward pages
    #[must_use]
    pub fn reversible(mut self) -> Self {
        self.reversible = true;
        self
    }

    /// Set the comparison modifier
    #[must_use]
    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.value_kind = kind;
        self
    }

    /// Compare this column at millisecond timestamp precision
    #[must_use]
    pub fn timestamp(self) -> Self {
        self.with_kind(ValueKind::Timestamp)
    }

    /// Compare this column under a type cast
    #[must_use]
    pub fn cast(self, ty: impl Into<String>) -> Self {
        self.with_kind(ValueKind::Cast(ty.into()))
    }
}

// ============================================================================
// Sort Key Spec
// ============================================================================

/// A named, ordered, non-empty list of sort columns.
///
/// At least one column must hold per-row-unique values (typically the
/// primary key); without one the ordering is not total and pagination
/// can stall on ties. The registry cannot verify uniqueness, it is the
/// caller's contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKeySpec {
    /// Registry name of this sort key
    pub name: String,
    /// Columns in ORDER BY / cursor tuple order
    pub columns: Vec<ColumnSpec>,
}

impl SortKeySpec {
    /// Create a spec (validated when registered)
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Number of columns, which is also the cursor tuple arity
    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable lookup from sort key name to spec
#[derive(Debug, Clone, Default)]
pub struct SortKeyRegistry {
    keys: BTreeMap<String, Arc<SortKeySpec>>,
    default_key: Option<String>,
}

impl SortKeyRegistry {
    /// Start building a registry
    pub fn builder() -> SortKeyRegistryBuilder {
        SortKeyRegistryBuilder::default()
    }

    /// Resolve a sort key by name.
    ///
    /// An omitted or empty name falls back to the configured default;
    /// with no default it fails with `SortKeyUndefined`. An unknown
    /// name fails with `SortKeyNotFound`.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<SortKeySpec>> {
        let requested = name.map(ToString::to_string).none_if_empty();
        let Some(name) = requested.or_else(|| self.default_key.clone()) else {
            return Err(Error::SortKeyUndefined);
        };

        self.keys
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::sort_key_not_found(name))
    }

    /// Name of the default sort key, if one is configured
    pub fn default_key(&self) -> Option<&str> {
        self.default_key.as_deref()
    }

    /// Registered sort key names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.keys.keys().map(String::as_str).collect()
    }

    /// Look up a spec without default fallback
    pub fn get(&self, name: &str) -> Option<Arc<SortKeySpec>> {
        self.keys.get(name).cloned()
    }

    /// Number of registered sort keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the registry has no sort keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Validating builder for [`SortKeyRegistry`]
#[derive(Debug, Default)]
pub struct SortKeyRegistryBuilder {
    specs: Vec<SortKeySpec>,
    default_key: Option<String>,
}

impl SortKeyRegistryBuilder {
    /// Register a sort key
    #[must_use]
    pub fn sort_key(mut self, name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        self.specs.push(SortKeySpec::new(name, columns));
        self
    }

    /// Register an already-built spec
    #[must_use]
    pub fn spec(mut self, spec: SortKeySpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Name the sort key used when a request names none
    #[must_use]
    pub fn default_sort_key(mut self, name: impl Into<String>) -> Self {
        self.default_key = Some(name.into());
        self
    }

    /// Validate and build the registry
    pub fn build(self) -> Result<SortKeyRegistry> {
        let mut keys = BTreeMap::new();

        for spec in self.specs {
            validate_spec(&spec)?;
            let name = spec.name.clone();
            if keys.insert(name.clone(), Arc::new(spec)).is_some() {
                return Err(Error::config(format!("Duplicate sort key '{name}'")));
            }
        }

        if let Some(default) = &self.default_key {
            if !keys.contains_key(default) {
                return Err(Error::config(format!(
                    "Default sort key '{default}' is not registered"
                )));
            }
        }

        Ok(SortKeyRegistry {
            keys,
            default_key: self.default_key,
        })
    }
}

/// Validate a single sort key spec
fn validate_spec(spec: &SortKeySpec) -> Result<()> {
    if spec.name.is_empty() {
        return Err(Error::config("Sort key name cannot be empty"));
    }

    if spec.columns.is_empty() {
        return Err(Error::config(format!(
            "Sort key '{}' must have at least one column",
            spec.name
        )));
    }

    for col in &spec.columns {
        if col.column.is_empty() {
            return Err(Error::config(format!(
                "Sort key '{}' has a column with an empty identifier",
                spec.name
            )));
        }

        if let ValueKind::Cast(ty) = &col.value_kind {
            if ty.is_empty() {
                return Err(Error::config(format!(
                    "Sort key '{}' column '{}' has an empty cast type",
                    spec.name, col.column
                )));
            }
        }
    }

    Ok(())
}
