//! Room model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::{RoomKind, RoomStatus};

/// Room record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Room {
    pub id: i32,
    /// Display name
    pub name: String,
    pub kind: RoomKind,
    /// Maximum number of attendees
    pub capacity: i32,
    /// Inactive rooms are never offered nor counted as busy
    pub active: bool,
}

/// Room with its occupancy status derived from bookings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomDetails {
    pub id: i32,
    pub name: String,
    pub kind: RoomKind,
    pub capacity: i32,
    pub active: bool,
    pub status: RoomStatus,
}

/// Row used to derive `RoomDetails`
#[derive(Debug, Clone, FromRow)]
pub struct RoomStatusRow {
    pub id: i32,
    pub name: String,
    pub kind: RoomKind,
    pub capacity: i32,
    pub active: bool,
    pub has_in_use: bool,
    pub has_approved: bool,
}

impl From<RoomStatusRow> for RoomDetails {
    fn from(row: RoomStatusRow) -> Self {
        Self {
            status: RoomStatus::derive(row.active, row.has_in_use, row.has_approved),
            id: row.id,
            name: row.name,
            kind: row.kind,
            capacity: row.capacity,
            active: row.active,
        }
    }
}

/// Minimal room reference used in availability responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomRef {
    pub id: i32,
    pub name: String,
}

impl From<&Room> for RoomRef {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
        }
    }
}

/// Create room request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoom {
    #[validate(length(min = 1, max = 200, message = "Room name must be 1-200 characters"))]
    pub name: String,
    /// Defaults to `room`
    pub kind: Option<RoomKind>,
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    pub capacity: i32,
    /// Defaults to true
    pub active: Option<bool>,
}

/// Update room request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoom {
    #[validate(length(min = 1, max = 200, message = "Room name must be 1-200 characters"))]
    pub name: Option<String>,
    pub kind: Option<RoomKind>,
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    pub capacity: Option<i32>,
    pub active: Option<bool>,
}

/// Active rooms split by whether a committed booking overlaps a window
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomAvailability {
    pub free: Vec<RoomRef>,
    pub busy: Vec<RoomRef>,
}
