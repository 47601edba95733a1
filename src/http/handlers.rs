use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    core::store::{ResetRequest, StoreError},
    history::ResetSummary,
    itinerary::{Itinerary, PartialResetOptions},
    types::{ResetType, format_timestamp, parse_instant},
};

use super::{
    AppState,
    response::{ApiError, ApiResponse},
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// `POST /reset` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetBody {
    /// `"complete"` or `"partial"`. Kept raw so any other value, of any JSON
    /// type, is answered as invalid options.
    #[serde(default)]
    pub reset_type: Option<Value>,
    /// Missing means purge.
    #[serde(default)]
    pub preserve_documents: Option<bool>,
    /// Filters for a partial reset.
    #[serde(default)]
    pub partial_reset_options: Option<PartialResetOptions>,
}

/// `POST /restore` body.
#[derive(Debug, Deserialize)]
pub struct RestoreBody {
    /// A timestamp exactly as `GET /reset-history` printed it. Kept raw so a
    /// value of the wrong JSON type is simply an unknown backup.
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// `GET /` body.
#[derive(Debug, Serialize)]
pub struct Welcome {
    /// Greeting line.
    pub message: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Service banner.
pub async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to the tripstate API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Complete or partial reset of the current itinerary.
pub async fn reset(
    State(state): State<AppState>,
    body: Result<Json<ResetBody>, JsonRejection>,
) -> ApiResult<Option<Itinerary>> {
    let Json(body) = body?;
    let reset_type = body
        .reset_type
        .as_ref()
        .and_then(Value::as_str)
        .and_then(ResetType::parse)
        .ok_or(StoreError::InvalidResetOptions)?;

    let outcome = state
        .handle
        .reset(ResetRequest {
            reset_type,
            preserve_documents: body.preserve_documents.unwrap_or(false),
            partial_reset_options: body.partial_reset_options,
        })
        .await?;

    let message = match outcome.reset_type {
        ResetType::Complete => "Itinerary completely reset successfully",
        ResetType::Partial => "Itinerary partially reset successfully",
    };
    let warnings = outcome.cleanup_warning();
    Ok(Json(
        ApiResponse::new(outcome.itinerary)
            .with_message(message)
            .with_warnings(warnings),
    ))
}

/// Every reset record without its snapshot, oldest first.
pub async fn reset_history(State(state): State<AppState>) -> ApiResult<Vec<ResetSummary>> {
    let history = state.handle.history().await?;
    Ok(Json(ApiResponse::new(history)))
}

/// Makes a recorded snapshot current again.
pub async fn restore(
    State(state): State<AppState>,
    body: Result<Json<RestoreBody>, JsonRejection>,
) -> ApiResult<Option<Itinerary>> {
    let Json(body) = body?;
    // Only the string a record is listed under names it; another spelling of
    // the same instant does not.
    let timestamp = body
        .timestamp
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| parse_instant(raw).filter(|ts| format_timestamp(ts) == raw))
        .ok_or(StoreError::BackupNotFound)?;

    let restored = state.handle.restore(timestamp).await?;
    Ok(Json(
        ApiResponse::new(restored).with_message("Itinerary restored successfully"),
    ))
}

/// The live itinerary; 404 when there is none.
pub async fn current(State(state): State<AppState>) -> ApiResult<Itinerary> {
    let itinerary = state.handle.current().await?.ok_or(ApiError::NoCurrentItinerary)?;
    Ok(Json(
        ApiResponse::new(itinerary).with_message("Latest itinerary data retrieved successfully"),
    ))
}

/// Producer write; `null` clears the itinerary.
pub async fn replace_current(
    State(state): State<AppState>,
    body: Result<Json<Option<Itinerary>>, JsonRejection>,
) -> ApiResult<Option<Itinerary>> {
    let Json(itinerary) = body?;
    state.handle.replace(itinerary.clone()).await?;
    Ok(Json(
        ApiResponse::new(itinerary).with_message("Itinerary updated successfully"),
    ))
}
