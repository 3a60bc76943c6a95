//! Conversion between wire timestamps and absolute time.
//!
//! Devices send time as fractional seconds since the Unix epoch (`ts`), the
//! whole part carrying seconds and the fraction carrying the sub-second
//! remainder. All instants are UTC.

use chrono::{DateTime, Utc};

use crate::error::ParseError;

// ---

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Smallest wire timestamp (exclusive) accepted as a real device clock
/// reading: 2017-07-14T02:40:00Z.
///
/// Devices without a synchronized clock report `0` or their uptime. Those
/// values are treated exactly like an omitted `ts`.
pub const MIN_PLAUSIBLE_EPOCH_SECS: f64 = 1_500_000_000.0;

/// Decode fractional epoch seconds into an absolute instant.
pub fn decode(raw: f64) -> Result<DateTime<Utc>, ParseError> {
    // ---
    if !raw.is_finite() {
        return Err(ParseError::Timestamp(raw));
    }

    let whole = raw.floor();
    let mut nanos = ((raw - whole) * NANOS_PER_SEC).round();
    let mut secs = whole as i64;
    if nanos >= NANOS_PER_SEC {
        secs = secs.checked_add(1).ok_or(ParseError::Timestamp(raw))?;
        nanos = 0.0;
    }

    DateTime::from_timestamp(secs, nanos as u32).ok_or(ParseError::Timestamp(raw))
}

/// Encode an absolute instant as fractional epoch seconds.
pub fn encode(t: DateTime<Utc>) -> f64 {
    // ---
    match t.timestamp_nanos_opt() {
        Some(nanos) => nanos as f64 / NANOS_PER_SEC,
        // Outside the i64 nanosecond range (years before 1677 or after 2262).
        None => t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) / NANOS_PER_SEC,
    }
}

/// Returns the supplied wire timestamp only if it looks like a real clock
/// reading, see [`MIN_PLAUSIBLE_EPOCH_SECS`].
pub fn plausible(raw: Option<f64>) -> Option<f64> {
    raw.filter(|ts| *ts > MIN_PLAUSIBLE_EPOCH_SECS)
}
