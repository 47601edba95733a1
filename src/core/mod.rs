//! In-memory itinerary store and reset engine.

/// Authoritative itinerary store with bounded reset history.
pub mod store;
