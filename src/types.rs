//! Shared primitive types, reset kinds and instant parsing.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a reset record: its creation instant at millisecond precision.
pub type RecordTimestamp = DateTime<Utc>;

/// Default number of reset records kept before FIFO eviction.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Kind of reset applied to the current itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetType {
    /// Clear the whole itinerary.
    Complete,
    /// Remove only activities matching the supplied filters.
    Partial,
}

impl ResetType {
    /// Parses the wire name. Anything other than `complete` or `partial` is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "complete" => Some(Self::Complete),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }

    /// Wire name of this reset type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
        }
    }
}

/// Current instant truncated to whole milliseconds.
pub fn now_millis() -> RecordTimestamp {
    truncate_millis(Utc::now())
}

/// Drops sub-millisecond precision so the value survives an ISO round trip.
pub fn truncate_millis(ts: RecordTimestamp) -> RecordTimestamp {
    Utc.timestamp_millis_opt(ts.timestamp_millis())
        .single()
        .unwrap_or(ts)
}

/// Returns `candidate`, or one millisecond past `last` when `candidate` does not advance it.
pub fn next_after(candidate: RecordTimestamp, last: Option<RecordTimestamp>) -> RecordTimestamp {
    match last {
        Some(last) if candidate <= last => last + Duration::milliseconds(1),
        _ => candidate,
    }
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_timestamp(ts: &RecordTimestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an instant from the formats itineraries carry in practice.
///
/// Accepts RFC 3339 with an offset, naive date-times (read as UTC) down to
/// minute precision, and bare dates (UTC midnight).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter writing [`RecordTimestamp`] in ISO form with milliseconds.
pub mod iso_millis {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{RecordTimestamp, format_timestamp, parse_instant};

    /// Serializes as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub fn serialize<S: Serializer>(ts: &RecordTimestamp, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(ts))
    }

    /// Deserializes any format accepted by [`parse_instant`].
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<RecordTimestamp, D::Error> {
        let raw = String::deserialize(d)?;
        parse_instant(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
