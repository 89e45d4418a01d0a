//! Error kinds raised by the scheduling engine

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::{lifecycle::Transition, TimeWindow};
use crate::models::{BookingStatus, DeviceCondition, DeviceLocation};

/// A policy rejection, carrying enough detail to show the caller why
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    /// The room is committed to another booking in an overlapping window
    RoomBooked {
        room_id: i32,
        blocking_booking_id: i32,
        blocking_status: BookingStatus,
        blocking_window: TimeWindow,
    },
    /// Another active booking holds some of the same devices
    DeviceBooked {
        blocking_booking_id: i32,
        blocking_window: TimeWindow,
        device_ids: Vec<i32>,
        device_names: Vec<String>,
    },
    /// A device cannot be attached in its current state
    DeviceNotReady {
        device_id: i32,
        device_name: String,
        location: DeviceLocation,
        condition: DeviceCondition,
    },
    /// Another booking is using the room right now
    RoomInUse {
        room_id: i32,
        blocking_booking_id: i32,
    },
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::RoomBooked {
                room_id,
                blocking_booking_id,
                blocking_status,
                blocking_window,
            } => write!(
                f,
                "room {} is already {} by booking {} for {}",
                room_id, blocking_status, blocking_booking_id, blocking_window
            ),
            Conflict::DeviceBooked {
                blocking_booking_id,
                blocking_window,
                device_names,
                ..
            } => write!(
                f,
                "device(s) {} already reserved by booking {} for {}",
                device_names.join(", "),
                blocking_booking_id,
                blocking_window
            ),
            Conflict::DeviceNotReady {
                device_id,
                device_name,
                location,
                condition,
            } => write!(
                f,
                "device {} ({}) is not available: location {}, condition {}",
                device_name, device_id, location, condition
            ),
            Conflict::RoomInUse {
                room_id,
                blocking_booking_id,
            } => write!(
                f,
                "room {} is currently in use by booking {}",
                room_id, blocking_booking_id
            ),
        }
    }
}

/// Request field the intent extractor failed to recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentField {
    Attendees,
    Date,
    TimeWindow,
    Devices,
}

impl std::fmt::Display for IntentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IntentField::Attendees => "attendee count",
            IntentField::Date => "date",
            IntentField::TimeWindow => "time window",
            IntentField::Devices => "devices",
        };
        write!(f, "{}", label)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(Conflict),

    #[error("Booking {booking_id} is {status}; cannot {action}")]
    InvalidState {
        booking_id: i32,
        status: BookingStatus,
        action: Transition,
    },

    #[error("Could not recognise the {field}: {message}")]
    Parse { field: IntentField, message: String },
}

impl From<Conflict> for SchedulingError {
    fn from(conflict: Conflict) -> Self {
        SchedulingError::Conflict(conflict)
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
