//! Row touch timestamps
//!
//! Stamps an `updated_at` column on update payloads with the same
//! RFC 3339 UTC millisecond text that cursors and keyset predicates
//! carry, so a touched column pages without re-normalization.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::types::{JsonValue, Row};

/// Column stamped by `touch`
pub const UPDATED_AT: &str = "updated_at";

/// Stamp `updated_at` with the current time.
///
/// Overwrites any value already present; callers keeping a hand-set
/// timestamp write it after touching.
pub fn touch(row: &mut Row) -> String {
    touch_at(row, Utc::now())
}

/// Stamp `updated_at` with an explicit time, returning the rendered
/// text
pub fn touch_at(row: &mut Row, at: DateTime<Utc>) -> String {
    let stamp = format_timestamp(at);
    row.insert(UPDATED_AT.to_string(), JsonValue::String(stamp.clone()));
    stamp
}

/// Render a timestamp as RFC 3339 UTC millisecond text
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.trunc_subsecs(3)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
