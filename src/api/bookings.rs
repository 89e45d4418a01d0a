//! Booking endpoints
//!
//! State-changing calls require the `X-Actor-Id` header.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{json_body, parse_window, Actor};
use crate::{
    error::{AppError, AppResult},
    models::{booking::BookingQuery, AuditRecord, BookingDetails, BookingStatus, NewBooking},
    services::bookings::TransitionOutcome,
    AppState,
};

/// Create booking request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub room_id: Option<i32>,
    pub requester_id: Option<i32>,
    #[schema(example = "2026-01-28 09:00:00")]
    pub from: Option<String>,
    #[schema(example = "2026-01-28 10:00:00")]
    pub to: Option<String>,
    /// Devices to bring; those already in the room are not reserved
    #[validate(length(max = 50, message = "At most 50 devices per booking"))]
    pub device_ids: Option<Vec<i32>>,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateBookingResponse {
    pub id: i32,
    pub display_name: String,
    pub status: BookingStatus,
}

/// Optional reason attached to a rejection or cancellation
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ReasonRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

impl CreateBookingRequest {
    fn into_new_booking(self) -> AppResult<NewBooking> {
        self.validate()?;

        let room_id = self
            .room_id
            .ok_or_else(|| AppError::BadRequest("Missing 'room_id'".to_string()))?;
        let requester_id = self
            .requester_id
            .ok_or_else(|| AppError::BadRequest("Missing 'requester_id'".to_string()))?;
        let window = parse_window(self.from.as_deref(), self.to.as_deref())?;

        Ok(NewBooking {
            room_id,
            requester_id,
            window,
            device_ids: self.device_ids.unwrap_or_default(),
            note: self.note.filter(|n| !n.trim().is_empty()),
        })
    }
}

fn reason(body: Option<Json<ReasonRequest>>) -> AppResult<Option<String>> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    body.validate()?;
    Ok(body.reason.filter(|r| !r.trim().is_empty()))
}

/// List bookings
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    params(BookingQuery),
    responses(
        (status = 200, description = "Booking list", body = Vec<BookingDetails>)
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let bookings = state.services.bookings.list(&query).await?;
    Ok(Json(bookings))
}

/// Get booking by ID
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = BookingDetails),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.get(id).await?;
    Ok(Json(booking))
}

/// Audit trail of a booking, newest first
#[utoipa::path(
    get,
    path = "/bookings/{id}/audit",
    tag = "bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Audit records", body = Vec<AuditRecord>)
    )
)]
pub async fn get_booking_audit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<AuditRecord>>> {
    let records = state.services.bookings.audit(id).await?;
    Ok(Json(records))
}

/// Submit a booking (created as pending)
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    request_body = CreateBookingRequest,
    params(("X-Actor-Id" = i32, Header, description = "Acting employee")),
    responses(
        (status = 201, description = "Booking created", body = CreateBookingResponse),
        (status = 400, description = "Missing or invalid field", body = crate::error::ErrorResponse),
        (status = 409, description = "Room or device conflict", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CreateBookingResponse>)> {
    let request = json_body(payload)?.into_new_booking()?;
    let details = state.services.bookings.submit(request, actor_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            id: details.booking.id,
            display_name: details.display_name,
            status: details.booking.status,
        }),
    ))
}

/// Approve a pending booking, auto-cancelling the pending bookings it beats
#[utoipa::path(
    post,
    path = "/bookings/{id}/approve",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID"),
        ("X-Actor-Id" = i32, Header, description = "Acting employee")
    ),
    responses(
        (status = 200, description = "Booking approved", body = TransitionOutcome),
        (status = 409, description = "Room or device conflict", body = crate::error::ErrorResponse),
        (status = 422, description = "Booking is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_booking(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
) -> AppResult<Json<TransitionOutcome>> {
    let outcome = state.services.bookings.approve(id, actor_id).await?;
    Ok(Json(outcome))
}

/// Reject a pending or approved booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/reject",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID"),
        ("X-Actor-Id" = i32, Header, description = "Acting employee")
    ),
    request_body = ReasonRequest,
    responses(
        (status = 200, description = "Booking rejected", body = TransitionOutcome),
        (status = 422, description = "Booking cannot be rejected", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_booking(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
    body: Option<Json<ReasonRequest>>,
) -> AppResult<Json<TransitionOutcome>> {
    let outcome = state.services.bookings.reject(id, actor_id, reason(body)?).await?;
    Ok(Json(outcome))
}

/// Cancel a pending or approved booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID"),
        ("X-Actor-Id" = i32, Header, description = "Acting employee")
    ),
    request_body = ReasonRequest,
    responses(
        (status = 200, description = "Booking cancelled", body = TransitionOutcome),
        (status = 422, description = "Booking cannot be cancelled", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
    body: Option<Json<ReasonRequest>>,
) -> AppResult<Json<TransitionOutcome>> {
    let outcome = state.services.bookings.cancel(id, actor_id, reason(body)?).await?;
    Ok(Json(outcome))
}

/// Start using an approved booking; its devices move into the room
#[utoipa::path(
    post,
    path = "/bookings/{id}/begin",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID"),
        ("X-Actor-Id" = i32, Header, description = "Acting employee")
    ),
    responses(
        (status = 200, description = "Booking in use", body = TransitionOutcome),
        (status = 409, description = "Room occupied or device unavailable", body = crate::error::ErrorResponse),
        (status = 422, description = "Booking is not approved", body = crate::error::ErrorResponse)
    )
)]
pub async fn begin_booking(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
) -> AppResult<Json<TransitionOutcome>> {
    let outcome = state.services.bookings.begin_use(id, actor_id).await?;
    Ok(Json(outcome))
}

/// Close a booking in use; its devices go back to the warehouse
#[utoipa::path(
    post,
    path = "/bookings/{id}/return",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID"),
        ("X-Actor-Id" = i32, Header, description = "Acting employee")
    ),
    responses(
        (status = 200, description = "Booking returned", body = TransitionOutcome),
        (status = 422, description = "Booking is not in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_booking(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
) -> AppResult<Json<TransitionOutcome>> {
    let outcome = state.services.bookings.return_booking(id, actor_id).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            room_id: Some(1),
            requester_id: Some(7),
            from: Some("2026-01-28 09:00:00".to_string()),
            to: Some("2026-01-28 10:00:00".to_string()),
            device_ids: None,
            note: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_request_to_new_booking() {
        let booking = request().into_new_booking().unwrap();
        assert_eq!(booking.room_id, 1);
        assert_eq!(booking.window.duration(), chrono::Duration::hours(1));
        assert!(booking.device_ids.is_empty());
        assert_eq!(booking.note, None);
    }

    #[test]
    fn test_missing_fields_are_bad_requests() {
        let missing_room = CreateBookingRequest {
            room_id: None,
            ..request()
        };
        assert!(matches!(missing_room.into_new_booking(), Err(AppError::BadRequest(_))));

        let missing_to = CreateBookingRequest {
            to: None,
            ..request()
        };
        assert!(matches!(missing_to.into_new_booking(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_non_increasing_window_is_bad_request() {
        let inverted = CreateBookingRequest {
            to: Some("2026-01-28 09:00:00".to_string()),
            ..request()
        };
        assert!(matches!(inverted.into_new_booking(), Err(AppError::BadRequest(_))));
    }
}
