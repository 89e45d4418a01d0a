//! Room availability endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{json_body, parse_window};
use crate::{error::AppResult, models::RoomRef, models::timestamp, AppState};

/// Window to check, `YYYY-MM-DD HH:MM:SS`
#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    #[schema(example = "2026-01-28 09:00:00")]
    pub from: Option<String>,
    #[schema(example = "2026-01-28 10:00:00")]
    pub to: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub from: String,
    pub to: String,
    /// Active rooms with no committed booking in the window
    pub free: Vec<RoomRef>,
    /// Active rooms with an approved or in-use booking overlapping the window
    pub busy: Vec<RoomRef>,
}

/// Check which rooms are free in a window
#[utoipa::path(
    post,
    path = "/availability",
    tag = "availability",
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Free and busy rooms", body = AvailabilityResponse),
        (status = 400, description = "Missing or malformed window", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_availability(
    State(state): State<AppState>,
    payload: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> AppResult<Json<AvailabilityResponse>> {
    let request = json_body(payload)?;
    let window = parse_window(request.from.as_deref(), request.to.as_deref())?;

    let availability = state.services.bookings.check_availability(&window).await?;

    Ok(Json(AvailabilityResponse {
        from: timestamp::format(&window.start),
        to: timestamp::format(&window.end),
        free: availability.free,
        busy: availability.busy,
    }))
}
