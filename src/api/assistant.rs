//! Booking assistant endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::{json_body, Actor};
use crate::{
    error::AppResult,
    scheduling::scanner::Suggestion,
    services::assistant::AssistantBooking,
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SuggestRequest {
    /// Free-form request, e.g. "phòng cho 10 người 9h-11h ngày mai, 1 máy chiếu"
    #[validate(length(min = 1, max = 1000, message = "Request text must be 1-1000 characters"))]
    pub text: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    #[validate(length(min = 1, max = 1000, message = "Request text must be 1-1000 characters"))]
    pub text: String,
    /// Defaults to the acting employee
    pub requester_id: Option<i32>,
}

/// Turn a free-text request into ranked rooms, devices to borrow and
/// alternative slots
#[utoipa::path(
    post,
    path = "/assistant/suggest",
    tag = "assistant",
    request_body = SuggestRequest,
    responses(
        (status = 200, description = "Suggestion", body = Suggestion),
        (status = 422, description = "Request not understood", body = crate::error::ErrorResponse)
    )
)]
pub async fn suggest(
    State(state): State<AppState>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> AppResult<Json<Suggestion>> {
    let request = json_body(payload)?;
    request.validate()?;

    let suggestion = state.services.assistant.suggest(&request.text).await?;
    Ok(Json(suggestion))
}

/// Book the recommended room for a free-text request
#[utoipa::path(
    post,
    path = "/assistant/book",
    tag = "assistant",
    request_body = BookRequest,
    params(("X-Actor-Id" = i32, Header, description = "Acting employee")),
    responses(
        (status = 201, description = "Booking submitted", body = AssistantBooking),
        (status = 409, description = "Suggested room or devices no longer free", body = crate::error::ErrorResponse),
        (status = 422, description = "Request not understood", body = crate::error::ErrorResponse)
    )
)]
pub async fn book(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AssistantBooking>)> {
    let request = json_body(payload)?;
    request.validate()?;

    let requester_id = request.requester_id.unwrap_or(actor_id);
    let booked = state
        .services
        .assistant
        .book(&request.text, requester_id, actor_id)
        .await?;

    Ok((StatusCode::CREATED, Json(booked)))
}
