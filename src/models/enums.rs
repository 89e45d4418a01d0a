//! Domain enums, stored as text slugs in PostgreSQL
//!
//! Room status, device condition, device location and booking status are
//! deliberately separate types: each has its own meaning and its own
//! transition rules.

use serde::{Deserialize, Serialize};
use sqlx::{
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    Decode, Encode, Postgres,
};
use utoipa::ToSchema;

/// Implements `as_str`, `Display`, `FromStr` and the SQLx text conversions
/// for a fieldless enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $slug:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $slug),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($slug => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as Decode<Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// RoomKind
// ---------------------------------------------------------------------------

/// Kind of bookable space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Room,
    Hall,
}

text_enum!(RoomKind {
    Room => "room",
    Hall => "hall",
});

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Room occupancy, derived from the room's bookings (never stored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Free,
    Reserved,
    Occupied,
}

text_enum!(RoomStatus {
    Free => "free",
    Reserved => "reserved",
    Occupied => "occupied",
});

impl RoomStatus {
    /// Derive the status from the room's active flag and whether it has any
    /// `in_use` / `approved` booking.
    pub fn derive(active: bool, has_in_use: bool, has_approved: bool) -> Self {
        if !active {
            RoomStatus::Free
        } else if has_in_use {
            RoomStatus::Occupied
        } else if has_approved {
            RoomStatus::Reserved
        } else {
            RoomStatus::Free
        }
    }
}

// ---------------------------------------------------------------------------
// DeviceCategory
// ---------------------------------------------------------------------------

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    Projector,
    Microphone,
    Speaker,
    AirConditioner,
    Computer,
    Other,
}

text_enum!(DeviceCategory {
    Projector => "projector",
    Microphone => "microphone",
    Speaker => "speaker",
    AirConditioner => "air_conditioner",
    Computer => "computer",
    Other => "other",
});

// ---------------------------------------------------------------------------
// DeviceLocation
// ---------------------------------------------------------------------------

/// Where a device physically is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceLocation {
    Warehouse,
    InRoom,
}

text_enum!(DeviceLocation {
    Warehouse => "warehouse",
    InRoom => "in_room",
});

impl DeviceLocation {
    /// A device is in a room iff it carries a room reference.
    pub fn check_room(self, room_id: Option<i32>) -> Result<(), String> {
        match (self, room_id) {
            (DeviceLocation::InRoom, None) => {
                Err("room_id is required when location is in_room".to_string())
            }
            (DeviceLocation::Warehouse, Some(_)) => {
                Err("room_id must be empty when location is warehouse".to_string())
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// DeviceCondition
// ---------------------------------------------------------------------------

/// Physical condition of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCondition {
    Ready,
    InUse,
    NeedsMaintenance,
    Broken,
}

text_enum!(DeviceCondition {
    Ready => "ready",
    InUse => "in_use",
    NeedsMaintenance => "needs_maintenance",
    Broken => "broken",
});

impl DeviceCondition {
    /// Condition transition table. Staying in the same condition is allowed.
    pub fn can_become(self, next: DeviceCondition) -> bool {
        use DeviceCondition::*;
        self == next
            || matches!(
                (self, next),
                (Ready, InUse)
                    | (Ready, NeedsMaintenance)
                    | (Ready, Broken)
                    | (InUse, Ready)
                    | (InUse, NeedsMaintenance)
                    | (InUse, Broken)
                    | (NeedsMaintenance, Ready)
                    | (NeedsMaintenance, Broken)
                    | (Broken, NeedsMaintenance)
            )
    }
}

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    InUse,
    Cancelled,
    Returned,
}

text_enum!(BookingStatus {
    Pending => "pending",
    Approved => "approved",
    InUse => "in_use",
    Cancelled => "cancelled",
    Returned => "returned",
});

impl BookingStatus {
    /// Not yet cancelled or returned
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved | BookingStatus::InUse)
    }

    /// Holds its room for its window
    pub fn is_committed(self) -> bool {
        matches!(self, BookingStatus::Approved | BookingStatus::InUse)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Returned)
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Action recorded in the booking audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Approve,
    Reject,
    Cancel,
    BeginUse,
    Return,
    AutoCancel,
}

text_enum!(AuditAction {
    Create => "create",
    Approve => "approve",
    Reject => "reject",
    Cancel => "cancel",
    BeginUse => "begin_use",
    Return => "return",
    AutoCancel => "auto_cancel",
});
