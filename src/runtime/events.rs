//! Runtime event stream payloads.

use crate::types::{RecordTimestamp, ResetType};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItineraryEvent {
    /// A producer replaced the current itinerary.
    Replaced {
        /// True when the new value is absent.
        cleared: bool,
    },
    /// A reset committed.
    Reset {
        /// History record created for it.
        timestamp: RecordTimestamp,
        /// Kind of reset.
        reset_type: ResetType,
    },
    /// A snapshot became current again.
    Restored {
        /// Record restored from.
        timestamp: RecordTimestamp,
    },
    /// Uploaded documents were deleted after a complete reset.
    DocumentsPurged {
        /// Files removed.
        removed: usize,
    },
    /// Document cleanup failed after the reset had already committed.
    PurgeFailed {
        /// Failure description.
        message: String,
    },
}
