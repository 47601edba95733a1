//! HTTP surface over the itinerary runtime.
//!
//! ```text
//! GET  /                             welcome
//! POST /api/itinerary/reset          reset the current itinerary
//! GET  /api/itinerary/reset-history  history metadata (no snapshots)
//! POST /api/itinerary/restore        restore a pre-reset snapshot
//! GET  /api/itinerary/current        read the current itinerary
//! PUT  /api/itinerary/current        producer write
//! ```

/// Endpoint handlers.
pub mod handlers;
/// Response envelope and error mapping.
pub mod response;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::runtime::handle::ItineraryHandle;

/// State shared with every handler.
#[derive(Clone)]
pub struct AppState {
    /// Connection to the single-writer store.
    pub handle: ItineraryHandle,
}

/// Builds the full application router.
pub fn router(handle: ItineraryHandle) -> Router {
    let itinerary = Router::new()
        .route("/reset", post(handlers::reset))
        .route("/reset-history", get(handlers::reset_history))
        .route("/restore", post(handlers::restore))
        .route(
            "/current",
            get(handlers::current).put(handlers::replace_current),
        );

    Router::new()
        .route("/", get(handlers::welcome))
        .nest("/api/itinerary", itinerary)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { handle })
}
