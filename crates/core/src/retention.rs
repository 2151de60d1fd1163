//! Retention window arithmetic and purge eligibility.
//!
//! Every storage backend ages dumps the same way: by the timestamp embedded
//! in the key (see [`crate::naming`]), never by filesystem or provider
//! modification times. Backends call [`classify_key`] for each object they
//! enumerate and delete only [`KeyVerdict::Expired`] ones.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::naming::{is_dump_key, parse_key_timestamp};
use crate::types::Timestamp;

/// Compute the purge cutoff for a retention window of `days`.
///
/// Returns `None` for `days == 0`, which means "never purge". Otherwise the
/// cutoff is `now - days`, truncated to midnight UTC. A window reaching past
/// the earliest representable date clamps to that date, so nothing is old
/// enough to purge.
pub fn retention_cutoff(now: Timestamp, days: u32) -> Option<Timestamp> {
    if days == 0 {
        return None;
    }

    let day = now
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .date_naive();
    let midnight = day.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

/// Outcome of checking one stored key against a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVerdict {
    /// Not a dump artifact; ignored.
    NotDump,
    /// A `.sql` key whose name is not a timestamp; ignored with a warning.
    Unparsable,
    /// Age marker is at or after the cutoff; kept.
    Retained(Timestamp),
    /// Age marker is strictly before the cutoff; to be deleted.
    Expired(Timestamp),
}

/// Decide what purge should do with `key`.
pub fn classify_key(key: &str, cutoff: Timestamp) -> KeyVerdict {
    if !is_dump_key(key) {
        return KeyVerdict::NotDump;
    }

    match parse_key_timestamp(key) {
        Ok(ts) if ts < cutoff => KeyVerdict::Expired(ts),
        Ok(ts) => KeyVerdict::Retained(ts),
        Err(_) => KeyVerdict::Unparsable,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
