//! In-memory itinerary state with reset, bounded history and restore.
//!
//! # Examples
//!
//! Direct use of [`core::store::ItineraryStore`]:
//! ```
//! use tripstate::{
//!     core::store::{ItineraryStore, ResetRequest},
//!     itinerary::{Itinerary, PartialResetOptions},
//! };
//!
//! let mut store = ItineraryStore::new();
//! let trip: Itinerary = serde_json::from_str(
//!     r#"{"activities": [
//!         {"type": "flight", "dateTime": "2025-04-15T08:00:00Z"},
//!         {"type": "hotel", "dateTime": "2025-04-20T10:00:00Z"}
//!     ]}"#,
//! ).expect("itinerary");
//! store.replace(Some(trip.clone()));
//!
//! let applied = store.reset(ResetRequest::partial(PartialResetOptions {
//!     activity_types: Some(vec!["flight".to_string()]),
//!     date_range: None,
//! })).expect("reset");
//! assert_eq!(applied.itinerary.expect("kept").activities().len(), 1);
//!
//! let restored = store.restore(&applied.timestamp).expect("restore");
//! assert_eq!(restored, Some(trip));
//! ```
//!
//! Runtime usage with an upload directory:
//! ```no_run
//! use tripstate::{
//!     core::store::{ItineraryStore, ResetRequest},
//!     documents::upload_dir::UploadDir,
//!     runtime::handle::{spawn_itinerary_store, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let docs = UploadDir::new("uploads");
//! let handle = spawn_itinerary_store(ItineraryStore::new(), Some(Box::new(docs)), RuntimeConfig::default());
//! let outcome = handle.reset(ResetRequest::complete(false)).await.expect("reset");
//! if let Some(warning) = outcome.cleanup_warning() {
//!     eprintln!("{warning}");
//! }
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Service configuration.
pub mod config;
/// Core in-memory store.
pub mod core;
/// Uploaded-document storage and purge.
pub mod documents;
/// Reset history records.
pub mod history;
/// HTTP router and handlers.
pub mod http;
/// Itinerary documents and partial-reset filters.
pub mod itinerary;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Tracing setup.
pub mod telemetry;
/// Shared primitive types.
pub mod types;
