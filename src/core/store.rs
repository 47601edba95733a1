use std::collections::VecDeque;

use crate::{
    history::{ResetRecord, ResetSummary},
    itinerary::{Itinerary, PartialResetOptions},
    types::{DEFAULT_HISTORY_LIMIT, RecordTimestamp, ResetType, next_after, now_millis},
};

/// Reasons a reset or restore is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Partial reset without options, or an unknown reset type.
    #[error("Invalid reset options")]
    InvalidResetOptions,
    /// Partial reset while no itinerary is set.
    #[error("No itinerary data to reset")]
    NoItinerary,
    /// No history record carries the requested timestamp.
    #[error("Backup not found")]
    BackupNotFound,
}

impl StoreError {
    /// True for errors caused by the request rather than missing state.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidResetOptions | Self::NoItinerary)
    }
}

/// One reset call as the caller phrased it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetRequest {
    /// Complete or partial.
    pub reset_type: ResetType,
    /// Keep uploaded documents on a complete reset.
    pub preserve_documents: bool,
    /// Filters for a partial reset; recorded as given for either type.
    pub partial_reset_options: Option<PartialResetOptions>,
}

impl ResetRequest {
    /// Complete reset with no filters.
    pub fn complete(preserve_documents: bool) -> Self {
        Self {
            reset_type: ResetType::Complete,
            preserve_documents,
            partial_reset_options: None,
        }
    }

    /// Partial reset; documents are never purged.
    pub fn partial(options: PartialResetOptions) -> Self {
        Self {
            reset_type: ResetType::Partial,
            preserve_documents: true,
            partial_reset_options: Some(options),
        }
    }
}

/// Committed result of a reset. The store never touches documents itself;
/// `purge_documents` tells the owner whether cleanup was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetApplied {
    /// Identifier of the history record written for this reset.
    pub timestamp: RecordTimestamp,
    /// The itinerary after the reset.
    pub itinerary: Option<Itinerary>,
    /// Whether the caller should now purge uploaded documents.
    pub purge_documents: bool,
}

/// Owner of the current itinerary and its bounded reset history.
#[derive(Debug)]
pub struct ItineraryStore {
    current: Option<Itinerary>,
    history: VecDeque<ResetRecord>,
    history_limit: usize,
    last_timestamp: Option<RecordTimestamp>,
}

impl Default for ItineraryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItineraryStore {
    /// Empty store keeping the default ten records.
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// A limit of zero is raised to one so the latest reset can always be undone.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            current: None,
            history: VecDeque::new(),
            history_limit: limit.max(1),
            last_timestamp: None,
        }
    }

    /// The live itinerary, if any.
    pub fn current(&self) -> Option<&Itinerary> {
        self.current.as_ref()
    }

    /// Owned copy of the live itinerary.
    pub fn current_cloned(&self) -> Option<Itinerary> {
        self.current.clone()
    }

    /// Producer write. Returns the value it displaced.
    pub fn replace(&mut self, itinerary: Option<Itinerary>) -> Option<Itinerary> {
        std::mem::replace(&mut self.current, itinerary)
    }

    /// Records a snapshot, then applies `request`.
    ///
    /// The record is written before partial-reset validation, so a rejected
    /// partial reset still leaves a history entry.
    pub fn reset(&mut self, request: ResetRequest) -> Result<ResetApplied, StoreError> {
        self.reset_at(request, now_millis())
    }

    /// Same as [`Self::reset`] with the record stamped at `now` (bumped if it
    /// does not advance past the previous record).
    pub fn reset_at(
        &mut self,
        request: ResetRequest,
        now: RecordTimestamp,
    ) -> Result<ResetApplied, StoreError> {
        let ResetRequest {
            reset_type,
            preserve_documents,
            partial_reset_options,
        } = request;

        // Recorded before any partial-reset check, so rejected attempts still
        // leave an entry to restore from.
        let timestamp = self.push_record(ResetRecord {
            timestamp: next_after(now, self.last_timestamp),
            snapshot: self.current.clone(),
            reset_type,
            partial_reset_options: partial_reset_options.clone(),
        });

        match reset_type {
            ResetType::Complete => {
                self.current = None;
                Ok(ResetApplied {
                    timestamp,
                    itinerary: None,
                    purge_documents: !preserve_documents,
                })
            }
            ResetType::Partial => {
                let options = partial_reset_options.ok_or(StoreError::InvalidResetOptions)?;
                let current = self.current.as_ref().ok_or(StoreError::NoItinerary)?;
                let updated = options.apply(current);
                self.current = Some(updated.clone());
                Ok(ResetApplied {
                    timestamp,
                    itinerary: Some(updated),
                    purge_documents: false,
                })
            }
        }
    }

    /// Public view of every record, oldest first.
    pub fn history(&self) -> Vec<ResetSummary> {
        self.history.iter().map(ResetRecord::summary).collect()
    }

    /// Records currently held.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Records kept before the oldest is evicted.
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Record stamped exactly `timestamp`.
    pub fn record(&self, timestamp: &RecordTimestamp) -> Option<&ResetRecord> {
        self.history.iter().find(|r| r.timestamp == *timestamp)
    }

    /// Makes a copy of the snapshot taken at `timestamp` current again.
    /// History is left as it is.
    pub fn restore(&mut self, timestamp: &RecordTimestamp) -> Result<Option<Itinerary>, StoreError> {
        let snapshot = self
            .record(timestamp)
            .ok_or(StoreError::BackupNotFound)?
            .snapshot
            .clone();
        self.current = snapshot.clone();
        Ok(snapshot)
    }

    fn push_record(&mut self, record: ResetRecord) -> RecordTimestamp {
        let timestamp = record.timestamp;
        self.history.push_back(record);
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}
