//! Itinerary document, activities and partial-reset filters.

use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::parse_instant;

const ACTIVITIES: &str = "activities";

/// The live itinerary document.
///
/// Held as the producer wrote it. Only the `activities` array is ever
/// interpreted, and a partial reset edits that array in place, so absent keys,
/// explicit nulls and key order all survive a snapshot and restore.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Itinerary {
    fields: Map<String, Value>,
}

impl Itinerary {
    /// Wraps an already parsed document.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// All top-level fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Top-level field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Scheduled items of the trip. Empty when `activities` is missing or is
    /// not an array.
    pub fn activities(&self) -> impl ExactSizeIterator<Item = Activity<'_>> {
        let list: &[Value] = self
            .fields
            .get(ACTIVITIES)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        list.iter().map(Activity)
    }

    fn activities_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.fields.get_mut(ACTIVITIES).and_then(Value::as_array_mut)
    }
}

impl From<Map<String, Value>> for Itinerary {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Read-only view of one entry of the `activities` array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activity<'a>(&'a Value);

impl<'a> Activity<'a> {
    /// The entry as stored.
    pub fn value(&self) -> &'a Value {
        self.0
    }

    /// Field by name; `None` for entries that are not objects.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        let value: &'a Value = self.0;
        value.get(key)
    }

    /// Category tag such as `flight`. Only string tags count.
    pub fn kind(&self) -> Option<&'a str> {
        self.get("type").and_then(Value::as_str)
    }

    /// Resolves `dateTime` to an instant. Strings go through
    /// [`parse_instant`]; numbers are epoch milliseconds.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self.get("dateTime")? {
            Value::String(raw) => parse_instant(raw),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            _ => None,
        }
    }
}

/// Inclusive instant window used to clear activities.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// First instant removed.
    #[serde(default, with = "optional_instant", skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Last instant removed.
    #[serde(default, with = "optional_instant", skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Both bounds, when the range is active.
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start?, self.end?))
    }
}

/// Filters selecting which activities a partial reset removes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialResetOptions {
    /// Categories to clear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_types: Option<Vec<String>>,
    /// Time window to clear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl PartialResetOptions {
    /// Returns a copy of `itinerary` with the selected activities removed.
    ///
    /// The type filter runs first, then the date filter on what survives it.
    /// The date filter keeps an activity only when its instant lies strictly
    /// before `start` or strictly after `end`; undated activities are cleared.
    /// A document without an `activities` array is returned unchanged.
    pub fn apply(&self, itinerary: &Itinerary) -> Itinerary {
        let mut updated = itinerary.clone();
        if let Some(activities) = updated.activities_mut() {
            if let Some(types) = self.activity_types.as_ref().filter(|t| !t.is_empty()) {
                let types: HashSet<&str> = types.iter().map(String::as_str).collect();
                activities.retain(|a| !Activity(a).kind().is_some_and(|k| types.contains(k)));
            }

            if let Some((start, end)) = self.date_range.as_ref().and_then(DateRange::bounds) {
                activities.retain(|a| {
                    Activity(a)
                        .instant()
                        .is_some_and(|at| at < start || at > end)
                });
            }
        }
        updated
    }
}

mod optional_instant {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use crate::types::parse_instant;

    pub fn serialize<S: Serializer>(v: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(ts) => s.serialize_str(&ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_instant(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {raw}"))),
        }
    }
}
