//! Audit trail emitter
//!
//! Builds the append-only records written alongside every committed
//! transition. Nothing here touches storage; the repository persists the
//! records inside the transition's transaction.

use chrono::NaiveDateTime;

use super::TimeWindow;
use crate::models::{AuditAction, Booking, BookingStatus, NewAuditRecord, NewBooking};

/// Why a pending booking was cancelled by someone else's approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeCause {
    /// Same room, overlapping window
    Room,
    /// Same requester, any room, overlapping window
    Requester,
}

impl CascadeCause {
    fn label(self) -> &'static str {
        match self {
            CascadeCause::Room => "room conflict",
            CascadeCause::Requester => "requester conflict",
        }
    }
}

/// Note for an action taken directly by the actor
pub fn direct_note(reason: Option<&str>) -> String {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("direct action: {}", reason),
        None => "direct action".to_string(),
    }
}

/// Note for a cascade cancellation, naming the approved booking that caused it
pub fn auto_cancel_note(cause: CascadeCause, approved_booking_id: i32) -> String {
    format!(
        "auto-cancelled: {} (approved booking {})",
        cause.label(),
        approved_booking_id
    )
}

#[allow(clippy::too_many_arguments)]
fn record(
    booking_id: Option<i32>,
    room_id: i32,
    requester_id: i32,
    window: TimeWindow,
    action: AuditAction,
    status_before: Option<BookingStatus>,
    status_after: BookingStatus,
    actor_id: i32,
    at: NaiveDateTime,
    note: Option<String>,
) -> NewAuditRecord {
    NewAuditRecord {
        booking_id,
        room_id,
        requester_id,
        planned_start: window.start,
        planned_end: window.end,
        action,
        status_before,
        status_after,
        actor_id,
        recorded_at: at,
        note,
    }
}

/// Record for a transition of an existing booking
pub fn emit(
    booking: &Booking,
    action: AuditAction,
    status_before: BookingStatus,
    status_after: BookingStatus,
    actor_id: i32,
    at: NaiveDateTime,
    note: Option<String>,
) -> NewAuditRecord {
    record(
        Some(booking.id),
        booking.room_id,
        booking.requester_id,
        booking.window(),
        action,
        Some(status_before),
        status_after,
        actor_id,
        at,
        note,
    )
}

/// Record for a booking being created; the id is filled in on insert
pub fn emit_creation(
    request: &NewBooking,
    actor_id: i32,
    at: NaiveDateTime,
    note: Option<String>,
) -> NewAuditRecord {
    record(
        None,
        request.room_id,
        request.requester_id,
        request.window,
        AuditAction::Create,
        None,
        BookingStatus::Pending,
        actor_id,
        at,
        note,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::fixtures::*;

    #[test]
    fn test_emit_denormalises_booking() {
        let b = booking(4, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending);
        let rec = emit(
            &b,
            AuditAction::Approve,
            BookingStatus::Pending,
            BookingStatus::Approved,
            7,
            at(8, 0),
            Some(direct_note(None)),
        );
        assert_eq!(rec.booking_id, Some(4));
        assert_eq!(rec.room_id, 10);
        assert_eq!(rec.requester_id, 100);
        assert_eq!(rec.planned_start, at(9, 0));
        assert_eq!(rec.status_before, Some(BookingStatus::Pending));
        assert_eq!(rec.actor_id, 7);
        assert_eq!(rec.note.as_deref(), Some("direct action"));
    }

    #[test]
    fn test_creation_has_no_prior_state() {
        let request = NewBooking {
            room_id: 1,
            requester_id: 2,
            window: window((9, 0), (10, 0)),
            device_ids: vec![],
            note: None,
        };
        let rec = emit_creation(&request, 2, at(8, 0), None);
        assert_eq!(rec.booking_id, None);
        assert_eq!(rec.action, AuditAction::Create);
        assert_eq!(rec.status_before, None);
        assert_eq!(rec.status_after, BookingStatus::Pending);
    }

    #[test]
    fn test_notes_distinguish_direct_and_cascade() {
        assert_eq!(direct_note(Some("  projector broke ")), "direct action: projector broke");
        assert_eq!(direct_note(Some("")), "direct action");
        assert_eq!(
            auto_cancel_note(CascadeCause::Room, 12),
            "auto-cancelled: room conflict (approved booking 12)"
        );
        assert!(auto_cancel_note(CascadeCause::Requester, 12).contains("requester conflict"));
    }
}
