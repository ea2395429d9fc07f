//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp used for refresh bookkeeping and bridge metadata.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp the way the emulated bridge reports its clock
/// (`2024-03-01T12:30:05`, no offset, no fraction).
#[must_use]
pub fn bridge_clock(ts: Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Render a timestamp as RFC 3339 with second precision.
#[must_use]
pub fn rfc3339(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
