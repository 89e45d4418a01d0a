//! Booking audit trail model

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{
    enums::{AuditAction, BookingStatus},
    timestamp,
};

/// Persisted audit record (append-only)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AuditRecord {
    pub id: i32,
    pub booking_id: i32,
    pub room_id: i32,
    pub requester_id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub planned_start: NaiveDateTime,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub planned_end: NaiveDateTime,
    pub action: AuditAction,
    /// Absent for the creation record
    pub status_before: Option<BookingStatus>,
    pub status_after: BookingStatus,
    pub actor_id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub recorded_at: NaiveDateTime,
    pub note: Option<String>,
}

/// Audit record not yet written
///
/// `booking_id` is `None` only for the creation record, whose booking id is
/// assigned by the insert.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NewAuditRecord {
    pub booking_id: Option<i32>,
    pub room_id: i32,
    pub requester_id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub planned_start: NaiveDateTime,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub planned_end: NaiveDateTime,
    pub action: AuditAction,
    pub status_before: Option<BookingStatus>,
    pub status_after: BookingStatus,
    pub actor_id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub recorded_at: NaiveDateTime,
    pub note: Option<String>,
}
