//! Slug generation
//!
//! Builds URL slugs from row fields. A `SlugGenerator` names the
//! source fields and how they combine; `unique_slug` layers a
//! numeric-suffix uniqueness loop over an async lookup seam, so the
//! probe runs against whatever store holds the existing slugs.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::{JsonValue, Row};

/// Runs of slug-safe characters after lowercasing
static SLUG_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+").unwrap());

/// How multiple source fields combine into the raw slug text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlugOperation {
    /// Use the first source field holding non-blank text
    #[default]
    GrabFirst,
    /// Join every non-blank source field with the separator
    Concat,
}

/// Store-side probe for the uniqueness loop.
///
/// Implementations return the existing slugs equal to `base` or to
/// `base` followed by characters; extra hits are filtered again here,
/// so a broad prefix scan is fine.
#[async_trait]
pub trait SlugLookup: Send + Sync {
    async fn similar_slugs(&self, base: &str) -> Result<Vec<String>>;
}

/// Builds slugs for one target field from one or more source fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugGenerator {
    /// Column the generated slug is written to
    field: String,
    /// Source columns read from the row, in priority order
    sources: Vec<String>,
    /// How multiple sources combine
    operation: SlugOperation,
    /// Separator between alphanumeric runs and concatenated sources
    separator: String,
    /// Maximum slug length in bytes, 0 = unlimited
    truncate: usize,
}

impl SlugGenerator {
    /// Create a generator writing to `field`, reading from `sources`
    pub fn new(field: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            field: field.into(),
            sources,
            operation: SlugOperation::default(),
            separator: "-".to_string(),
            truncate: 50,
        }
    }

    /// Set how multiple sources combine
    #[must_use]
    pub fn with_operation(mut self, operation: SlugOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Set the separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the maximum slug length in bytes, 0 to disable
    #[must_use]
    pub fn with_truncate(mut self, truncate: usize) -> Self {
        self.truncate = truncate;
        self
    }

    /// Column the generated slug is written to
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Slug for `row`, falling back to a time-derived value when no
    /// source yields content
    pub fn slug_for(&self, row: &Row) -> String {
        let Some(text) = self.source_text(row) else {
            return fallback_slug();
        };

        let mut slug = slugify(&text, &self.separator);
        if slug.is_empty() {
            // Sources held text, none of it slug-safe
            return fallback_slug();
        }
        if self.truncate > 0 && slug.len() > self.truncate {
            let mut end = self.truncate;
            while !slug.is_char_boundary(end) {
                end -= 1;
            }
            slug.truncate(end);
        }
        slug
    }

    /// Slug for `row`, suffixed with the next free number when the
    /// base is already taken.
    ///
    /// An existing bare `base` yields `base2`; existing `base`,
    /// `base1`, `base9` yield `base10`. A base nobody holds comes
    /// back unchanged even when suffixed variants exist.
    pub async fn unique_slug(&self, row: &Row, lookup: &dyn SlugLookup) -> Result<String> {
        let base = self.slug_for(row);
        let existing = lookup.similar_slugs(&base).await?;

        let suffixed = Regex::new(&format!("^{}([0-9]*)$", regex::escape(&base)))
            .map_err(|e| Error::config(format!("slug probe pattern: {e}")))?;

        let mut base_taken = false;
        let mut max_suffix: Option<u64> = None;
        for slug in &existing {
            let Some(caps) = suffixed.captures(slug) else {
                continue;
            };
            let digits = &caps[1];
            if digits.is_empty() {
                base_taken = true;
            } else if let Ok(n) = digits.parse::<u64>() {
                max_suffix = Some(max_suffix.map_or(n, |prev| prev.max(n)));
            }
        }

        if !base_taken {
            return Ok(base);
        }
        let next = max_suffix.map_or(2, |n| n + 1);
        Ok(format!("{base}{next}"))
    }

    /// Generate a unique slug and write it into the row's target
    /// field. An existing non-blank value wins over generation.
    pub async fn stamp(&self, row: &mut Row, lookup: &dyn SlugLookup) -> Result<String> {
        if let Some(existing) = row.get(&self.field).and_then(value_text) {
            if !existing.trim().is_empty() {
                return Ok(existing);
            }
        }

        let slug = self.unique_slug(row, lookup).await?;
        row.insert(self.field.clone(), JsonValue::String(slug.clone()));
        Ok(slug)
    }

    /// Raw text the slug derives from, per the configured operation
    fn source_text(&self, row: &Row) -> Option<String> {
        match self.operation {
            SlugOperation::GrabFirst => self
                .sources
                .iter()
                .filter_map(|name| row.get(name).and_then(value_text))
                .find(|text| !text.trim().is_empty()),
            SlugOperation::Concat => {
                let parts: Vec<String> = self
                    .sources
                    .iter()
                    .filter_map(|name| row.get(name).and_then(value_text))
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
                    .collect();
                (!parts.is_empty()).then(|| parts.join(&self.separator))
            }
        }
    }
}

/// Lowercase `text` and join its alphanumeric runs with `separator`.
///
/// Transliteration-free: characters outside `[a-z0-9]` after
/// lowercasing act as boundaries and drop out.
pub fn slugify(text: &str, separator: &str) -> String {
    let lowered = text.to_lowercase();
    let runs: Vec<&str> = SLUG_RUNS.find_iter(&lowered).map(|m| m.as_str()).collect();
    runs.join(separator)
}

/// Text content of a JSON value, for slug sources.
///
/// Strings pass through, numbers and booleans render, null and
/// containers yield nothing.
fn value_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// Time-derived slug used when no source yields content
fn fallback_slug() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{timestamp:x}")
}
