//! Booking model and related types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::{enums::BookingStatus, timestamp};
use crate::scheduling::TimeWindow;

/// Booking record
///
/// `device_ids` lists only devices taken from the warehouse; equipment built
/// into the room is never listed.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: i32,
    pub room_id: i32,
    pub requester_id: i32,
    pub device_ids: Vec<i32>,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String, example = "2026-01-28 08:00:00")]
    pub planned_start: NaiveDateTime,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String, example = "2026-01-28 10:00:00")]
    pub planned_end: NaiveDateTime,
    #[serde(serialize_with = "timestamp::option::serialize")]
    #[schema(value_type = Option<String>)]
    pub actual_start: Option<NaiveDateTime>,
    #[serde(serialize_with = "timestamp::option::serialize")]
    #[schema(value_type = Option<String>)]
    pub actual_end: Option<NaiveDateTime>,
    pub status: BookingStatus,
    pub approved_by: Option<i32>,
    #[serde(serialize_with = "timestamp::option::serialize")]
    #[schema(value_type = Option<String>)]
    pub approved_at: Option<NaiveDateTime>,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
}

impl Booking {
    /// Planned window
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.planned_start,
            end: self.planned_end,
        }
    }

    pub fn references_device(&self, device_id: i32) -> bool {
        self.device_ids.contains(&device_id)
    }
}

/// Booking with resolved room and requester names
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub room_name: String,
    pub requester_name: String,
    pub display_name: String,
}

impl BookingDetails {
    pub fn new(booking: Booking, room_name: String, requester_name: String) -> Self {
        let display_name = display_name(&room_name, &requester_name, &booking.planned_start);
        Self {
            booking,
            room_name,
            requester_name,
            display_name,
        }
    }
}

/// Human-readable booking label: room, requester and planned start
pub fn display_name(room_name: &str, requester_name: &str, start: &NaiveDateTime) -> String {
    format!("{} / {} / {}", room_name, requester_name, start.format("%Y-%m-%d %H:%M"))
}

/// Validated input for a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub room_id: i32,
    pub requester_id: i32,
    pub window: TimeWindow,
    pub device_ids: Vec<i32>,
    /// Extra context for the creation audit record
    pub note: Option<String>,
}

/// Query parameters for booking listing
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookingQuery {
    pub room_id: Option<i32>,
    pub requester_id: Option<i32>,
    pub status: Option<BookingStatus>,
    /// Only bookings overlapping [from, to) (YYYY-MM-DD HH:MM:SS)
    pub from: Option<String>,
    pub to: Option<String>,
}
