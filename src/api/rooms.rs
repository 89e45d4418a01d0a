//! Room registry endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::{
        room::{CreateRoom, UpdateRoom},
        timestamp,
        usage::RoomUsageSummary,
        AuditRecord, Device, Room, RoomDetails,
    },
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct UsageQuery {
    /// Day to summarise, `YYYY-MM-DD`
    pub date: Option<String>,
}

/// List rooms with their current status
#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    responses(
        (status = 200, description = "Room list", body = Vec<RoomDetails>)
    )
)]
pub async fn list_rooms(State(state): State<AppState>) -> AppResult<Json<Vec<RoomDetails>>> {
    let rooms = state.services.rooms.list().await?;
    Ok(Json(rooms))
}

/// Get room by ID
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "rooms",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room details", body = RoomDetails),
        (status = 404, description = "Room not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<RoomDetails>> {
    let room = state.services.rooms.get(id).await?;
    Ok(Json(room))
}

/// Create room
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoom,
    responses(
        (status = 201, description = "Room created", body = Room),
        (status = 400, description = "Invalid room", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_room(
    State(state): State<AppState>,
    Json(data): Json<CreateRoom>,
) -> AppResult<(StatusCode, Json<Room>)> {
    let room = state.services.rooms.create(&data).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// Update room
#[utoipa::path(
    put,
    path = "/rooms/{id}",
    tag = "rooms",
    params(("id" = i32, Path, description = "Room ID")),
    request_body = UpdateRoom,
    responses(
        (status = 200, description = "Room updated", body = Room)
    )
)]
pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(data): Json<UpdateRoom>,
) -> AppResult<Json<Room>> {
    let room = state.services.rooms.update(id, &data).await?;
    Ok(Json(room))
}

/// List devices built into a room
#[utoipa::path(
    get,
    path = "/rooms/{id}/devices",
    tag = "rooms",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Built-in devices", body = Vec<Device>)
    )
)]
pub async fn list_room_devices(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Device>>> {
    let devices = state.services.rooms.devices(id).await?;
    Ok(Json(devices))
}

/// Daily usage summary of a room
#[utoipa::path(
    get,
    path = "/rooms/{id}/usage",
    tag = "rooms",
    params(("id" = i32, Path, description = "Room ID"), UsageQuery),
    responses(
        (status = 200, description = "Usage summary", body = RoomUsageSummary),
        (status = 400, description = "Missing or malformed date", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_room_usage(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<UsageQuery>,
) -> AppResult<Json<RoomUsageSummary>> {
    let date = query
        .date
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Missing 'date'".to_string()))?;
    let date = timestamp::parse_date("date", date)?;

    let summary = state.services.rooms.usage(id, date).await?;
    Ok(Json(summary))
}

/// Audit trail of a room's bookings, newest first
#[utoipa::path(
    get,
    path = "/rooms/{id}/audit",
    tag = "rooms",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Audit records", body = Vec<AuditRecord>)
    )
)]
pub async fn get_room_audit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<AuditRecord>>> {
    let records = state.services.rooms.audit(id).await?;
    Ok(Json(records))
}
