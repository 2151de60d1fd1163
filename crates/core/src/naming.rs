//! Storage key naming for dump artifacts.
//!
//! Canonical layout:
//!
//! - full dumps: `dumps/<schema>/<timestamp>.sql`
//! - DDL exports: `ddl/<schema>.sql`
//!
//! `<timestamp>` is UTC RFC-3339 with the `:` separators replaced by `-`
//! (`2024-06-01T13-45-00Z`) so the key is a valid filename everywhere. The
//! parser accepts both the dashed and the plain RFC-3339 form and only ever
//! looks at the final path segment, so flat `dumps/<timestamp>.sql` keys age
//! the same way as nested ones.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Namespace prefix under which all full dumps live (and purge looks).
pub const DUMP_PREFIX: &str = "dumps/";

/// Directory name of [`DUMP_PREFIX`] on a local filesystem.
pub const DUMP_DIR: &str = "dumps";

/// Prefix for schema-only exports.
pub const DDL_PREFIX: &str = "ddl/";

/// Suffix carried by every dump artifact.
pub const DUMP_SUFFIX: &str = ".sql";

/// `strftime` format of the timestamp embedded in dump keys.
const KEY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

// ---------------------------------------------------------------------------
// Key construction
// ---------------------------------------------------------------------------

/// Format a timestamp the way it is embedded in dump keys.
pub fn format_key_timestamp(ts: Timestamp) -> String {
    ts.format(KEY_TIMESTAMP_FORMAT).to_string()
}

/// Key for a full dump of `schema` taken at `ts`.
///
/// ```
/// use chrono::TimeZone;
/// use dumpster_core::naming::dump_key;
///
/// let ts = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 13, 45, 0).unwrap();
/// assert_eq!(dump_key("shop", ts), "dumps/shop/2024-06-01T13-45-00Z.sql");
/// ```
pub fn dump_key(schema: &str, ts: Timestamp) -> String {
    format!(
        "{DUMP_PREFIX}{schema}/{}{DUMP_SUFFIX}",
        format_key_timestamp(ts)
    )
}

/// Key for the schema-only export of `schema`. Overwritten on every run.
pub fn ddl_key(schema: &str) -> String {
    format!("{DDL_PREFIX}{schema}{DUMP_SUFFIX}")
}

// ---------------------------------------------------------------------------
// Key inspection
// ---------------------------------------------------------------------------

/// Whether `key` names a dump artifact (ends in [`DUMP_SUFFIX`]).
pub fn is_dump_key(key: &str) -> bool {
    key.ends_with(DUMP_SUFFIX)
}

/// Final path segment of a `/`-separated key.
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Parse the age marker embedded in a dump key.
///
/// Only the final path segment is considered; it must be
/// `<timestamp>.sql`.
pub fn parse_key_timestamp(key: &str) -> Result<Timestamp, CoreError> {
    let name = file_name(key);
    let stem = name
        .strip_suffix(DUMP_SUFFIX)
        .ok_or_else(|| CoreError::InvalidTimestamp(name.to_string()))?;

    let normalized =
        restore_colons(stem).ok_or_else(|| CoreError::InvalidTimestamp(stem.to_string()))?;

    DateTime::parse_from_rfc3339(&normalized)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidTimestamp(stem.to_string()))
}

/// Turn `2024-06-01T13-45-00.5-05-00` back into `2024-06-01T13:45:00.5-05:00`.
///
/// Input that already uses `:` passes through unchanged.
fn restore_colons(stem: &str) -> Option<String> {
    let (date, time) = stem.split_once(['T', 't'])?;
    if time.len() < 8 || !time.is_char_boundary(8) {
        return None;
    }

    let (clock, rest) = time.split_at(8);
    let clock = clock.replacen('-', ":", 2);

    // `rest` is an optional fraction followed by the zone designator.
    let zone_start = rest.find(['Z', 'z', '+', '-'])?;
    let (fraction, zone) = rest.split_at(zone_start);

    let zone = if zone.len() == 6 && zone.as_bytes()[3] == b'-' {
        format!("{}:{}", &zone[..3], &zone[4..])
    } else {
        zone.to_string()
    };

    Some(format!("{date}T{clock}{fraction}{zone}"))
}

// ---------------------------------------------------------------------------
// Key validation
// ---------------------------------------------------------------------------

/// Reject keys that could escape a storage root.
///
/// Keys must be non-empty, relative, and free of `.`/`..` segments.
pub fn validate_key(key: &str) -> Result<(), CoreError> {
    let invalid = |reason| CoreError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.starts_with('/') || key.starts_with('\\') {
        return Err(invalid("key must be relative"));
    }
    if key
        .split(['/', '\\'])
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid("key contains an empty, '.' or '..' segment"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
