//! Reset history records and their public projection.

use serde::{Deserialize, Serialize};

use crate::{
    itinerary::{Itinerary, PartialResetOptions},
    types::{RecordTimestamp, ResetType, iso_millis},
};

/// Immutable entry captured every time a reset is attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetRecord {
    /// Creation instant; unique within one store.
    pub timestamp: RecordTimestamp,
    /// Itinerary as it was immediately before the reset.
    pub snapshot: Option<Itinerary>,
    /// Requested reset kind.
    pub reset_type: ResetType,
    /// Filters supplied with the request.
    pub partial_reset_options: Option<PartialResetOptions>,
}

impl ResetRecord {
    /// Metadata view without the snapshot.
    pub fn summary(&self) -> ResetSummary {
        ResetSummary {
            timestamp: self.timestamp,
            reset_type: self.reset_type,
            partial_reset_options: self.partial_reset_options.clone(),
        }
    }
}

/// History entry as exposed to clients. Never carries itinerary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSummary {
    /// Record identifier, usable with restore.
    #[serde(with = "iso_millis")]
    pub timestamp: RecordTimestamp,
    /// Requested reset kind.
    pub reset_type: ResetType,
    /// Filters supplied with the request.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub partial_reset_options: Option<PartialResetOptions>,
}
