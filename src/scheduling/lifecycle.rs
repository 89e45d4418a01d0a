//! Booking state machine
//!
//! ```text
//! pending ──approve──▶ approved ──begin──▶ in_use ──return──▶ returned
//!    │                    │
//!    └──reject/cancel─────┴──────────────▶ cancelled
//! ```
//!
//! Every planner takes the booking, the rows its checks need and the acting
//! employee, and returns the full set of writes for the transition. The
//! service applies a plan in one transaction or not at all.

use chrono::NaiveDateTime;

use super::{
    audit::{self, CascadeCause},
    conflict::{self, RoomPolicy},
    SchedulingError, SchedulingResult,
};
use crate::models::{
    AuditAction, Booking, BookingStatus, Device, DeviceCondition, DeviceLocation,
    NewAuditRecord, NewBooking,
};

/// Caller-driven transitions of an existing booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject,
    Cancel,
    BeginUse,
    Return,
}

impl Transition {
    /// States the transition may start from
    pub fn sources(self) -> &'static [BookingStatus] {
        match self {
            Transition::Approve => &[BookingStatus::Pending],
            Transition::Reject | Transition::Cancel => {
                &[BookingStatus::Pending, BookingStatus::Approved]
            }
            Transition::BeginUse => &[BookingStatus::Approved],
            Transition::Return => &[BookingStatus::InUse],
        }
    }

    pub fn target(self) -> BookingStatus {
        match self {
            Transition::Approve => BookingStatus::Approved,
            Transition::Reject | Transition::Cancel => BookingStatus::Cancelled,
            Transition::BeginUse => BookingStatus::InUse,
            Transition::Return => BookingStatus::Returned,
        }
    }

    pub fn audit_action(self) -> AuditAction {
        match self {
            Transition::Approve => AuditAction::Approve,
            Transition::Reject => AuditAction::Reject,
            Transition::Cancel => AuditAction::Cancel,
            Transition::BeginUse => AuditAction::BeginUse,
            Transition::Return => AuditAction::Return,
        }
    }

    fn ensure_allowed(self, booking: &Booking) -> SchedulingResult<()> {
        if self.sources().contains(&booking.status) {
            Ok(())
        } else {
            Err(SchedulingError::InvalidState {
                booking_id: booking.id,
                status: booking.status,
                action: self,
            })
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Cancel => "cancel",
            Transition::BeginUse => "begin use",
            Transition::Return => "return",
        };
        write!(f, "{}", verb)
    }
}

/// New location and condition of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMove {
    pub device_id: i32,
    pub location: DeviceLocation,
    pub room_id: Option<i32>,
    pub condition: DeviceCondition,
}

/// Writes needed to create a booking
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitPlan {
    /// Warehouse devices reserved by the booking
    pub device_ids: Vec<i32>,
    /// Requested devices already in the room; not stored on the booking
    pub built_in_ids: Vec<i32>,
    pub audit: NewAuditRecord,
}

/// Writes needed to move an existing booking to its next state
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub transition: Transition,
    pub status_before: BookingStatus,
    /// The booking as it will be after the transition
    pub booking: Booking,
    /// Other bookings cancelled as a consequence, in their new state
    pub cascaded: Vec<Booking>,
    pub device_moves: Vec<DeviceMove>,
    /// One record for the booking, then one per cascaded booking
    pub audit: Vec<NewAuditRecord>,
}

impl TransitionPlan {
    fn new(
        transition: Transition,
        before: &Booking,
        after: Booking,
        actor_id: i32,
        now: NaiveDateTime,
        note: Option<String>,
    ) -> Self {
        let record = audit::emit(
            before,
            transition.audit_action(),
            before.status,
            after.status,
            actor_id,
            now,
            note,
        );
        Self {
            transition,
            status_before: before.status,
            booking: after,
            cascaded: Vec::new(),
            device_moves: Vec::new(),
            audit: vec![record],
        }
    }
}

fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Only the devices the booking lists, in id order
fn listed_devices<'a>(booking: &Booking, devices: &'a [Device]) -> Vec<&'a Device> {
    let mut listed: Vec<&Device> = devices
        .iter()
        .filter(|d| booking.references_device(d.id))
        .collect();
    listed.sort_by_key(|d| d.id);
    listed
}

/// `submit`: lenient room policy, device readiness and device policy.
///
/// `devices` must hold every device named in the request; `existing` the
/// room's bookings plus the active bookings referencing those devices.
pub fn plan_submit(
    request: &NewBooking,
    devices: &[Device],
    existing: &[Booking],
    actor_id: i32,
    now: NaiveDateTime,
) -> SchedulingResult<SubmitPlan> {
    let requested = dedup_ids(&request.device_ids);
    if let Some(missing) = requested.iter().find(|id| !devices.iter().any(|d| d.id == **id)) {
        return Err(SchedulingError::Validation(format!("unknown device {}", missing)));
    }
    let requested_devices: Vec<Device> = devices
        .iter()
        .filter(|d| requested.contains(&d.id))
        .cloned()
        .collect();

    let selection = conflict::check_readiness(&requested_devices, request.room_id)?;

    conflict::check_room(RoomPolicy::Lenient, existing, request.room_id, &request.window, None)?;

    let warehouse: Vec<Device> = requested_devices
        .into_iter()
        .filter(|d| selection.warehouse.contains(&d.id))
        .collect();
    conflict::check_devices(existing, &warehouse, &request.window, None)?;

    let mut notes: Vec<String> = request.note.iter().cloned().collect();
    if !selection.built_in.is_empty() {
        let ids: Vec<String> = selection.built_in.iter().map(|id| id.to_string()).collect();
        notes.push(format!("built-in devices not reserved: {}", ids.join(", ")));
    }
    let note = (!notes.is_empty()).then(|| notes.join("; "));

    Ok(SubmitPlan {
        audit: audit::emit_creation(request, actor_id, now, note),
        device_ids: selection.warehouse,
        built_in_ids: selection.built_in,
    })
}

/// `approve`: strict room policy and device policy, then cascade.
///
/// `existing` must contain the committed bookings of the room, the pending
/// bookings of the room and of the requester, and the active bookings
/// referencing the booking's devices.
pub fn plan_approve(
    booking: &Booking,
    devices: &[Device],
    existing: &[Booking],
    actor_id: i32,
    now: NaiveDateTime,
) -> SchedulingResult<TransitionPlan> {
    Transition::Approve.ensure_allowed(booking)?;

    let window = booking.window();
    conflict::check_room(RoomPolicy::Strict, existing, booking.room_id, &window, Some(booking.id))?;
    let listed: Vec<Device> = listed_devices(booking, devices).into_iter().cloned().collect();
    conflict::check_devices(existing, &listed, &window, Some(booking.id))?;

    let mut approved = booking.clone();
    approved.status = BookingStatus::Approved;
    approved.approved_by = Some(actor_id);
    approved.approved_at = Some(now);

    let mut plan = TransitionPlan::new(
        Transition::Approve,
        booking,
        approved,
        actor_id,
        now,
        Some(audit::direct_note(None)),
    );

    let mut victims: Vec<(&Booking, CascadeCause)> = existing
        .iter()
        .filter(|b| b.id != booking.id && b.status == BookingStatus::Pending)
        .filter(|b| b.window().overlaps(&window))
        .filter_map(|b| {
            if b.room_id == booking.room_id {
                Some((b, CascadeCause::Room))
            } else if b.requester_id == booking.requester_id {
                Some((b, CascadeCause::Requester))
            } else {
                None
            }
        })
        .collect();
    victims.sort_by_key(|(b, _)| b.id);
    victims.dedup_by_key(|(b, _)| b.id);

    for (victim, cause) in victims {
        let mut cancelled = victim.clone();
        cancelled.status = BookingStatus::Cancelled;
        plan.audit.push(audit::emit(
            victim,
            AuditAction::AutoCancel,
            victim.status,
            BookingStatus::Cancelled,
            actor_id,
            now,
            Some(audit::auto_cancel_note(cause, booking.id)),
        ));
        plan.cascaded.push(cancelled);
    }

    Ok(plan)
}

/// `reject` or `cancel`, from `pending` or `approved`
pub fn plan_cancel(
    booking: &Booking,
    transition: Transition,
    actor_id: i32,
    now: NaiveDateTime,
    reason: Option<&str>,
) -> SchedulingResult<TransitionPlan> {
    if !matches!(transition, Transition::Reject | Transition::Cancel) {
        return Err(SchedulingError::Validation(format!(
            "{} is not a cancellation",
            transition
        )));
    }
    transition.ensure_allowed(booking)?;

    let mut cancelled = booking.clone();
    cancelled.status = BookingStatus::Cancelled;

    Ok(TransitionPlan::new(
        transition,
        booking,
        cancelled,
        actor_id,
        now,
        Some(audit::direct_note(reason)),
    ))
}

/// `begin_use`: the room must be idle, the devices still ready and free.
///
/// `existing` must contain the room's bookings and the active bookings
/// referencing the booking's devices.
pub fn plan_begin_use(
    booking: &Booking,
    devices: &[Device],
    existing: &[Booking],
    actor_id: i32,
    now: NaiveDateTime,
) -> SchedulingResult<TransitionPlan> {
    Transition::BeginUse.ensure_allowed(booking)?;

    let window = booking.window();
    conflict::check_room_idle(existing, booking.room_id, Some(booking.id))?;
    conflict::check_room(RoomPolicy::Strict, existing, booking.room_id, &window, Some(booking.id))?;

    let listed: Vec<Device> = listed_devices(booking, devices).into_iter().cloned().collect();
    if listed.len() != booking.device_ids.len() {
        return Err(SchedulingError::Validation(format!(
            "booking {} references devices that no longer exist",
            booking.id
        )));
    }
    conflict::check_readiness(&listed, booking.room_id)?;
    conflict::check_devices(existing, &listed, &window, Some(booking.id))?;

    let mut started = booking.clone();
    started.status = BookingStatus::InUse;
    started.actual_start = Some(now);

    let mut plan = TransitionPlan::new(
        Transition::BeginUse,
        booking,
        started,
        actor_id,
        now,
        Some(audit::direct_note(None)),
    );
    plan.device_moves = listed
        .iter()
        .map(|d| DeviceMove {
            device_id: d.id,
            location: DeviceLocation::InRoom,
            room_id: Some(booking.room_id),
            condition: DeviceCondition::InUse,
        })
        .collect();

    Ok(plan)
}

/// `return`: close actual usage and send the devices back to the warehouse
pub fn plan_return(
    booking: &Booking,
    actor_id: i32,
    now: NaiveDateTime,
) -> SchedulingResult<TransitionPlan> {
    Transition::Return.ensure_allowed(booking)?;

    let mut returned = booking.clone();
    returned.status = BookingStatus::Returned;
    if returned.actual_start.is_none() {
        returned.actual_start = Some(booking.planned_start.min(now));
    }
    returned.actual_end = Some(now);

    let mut plan = TransitionPlan::new(
        Transition::Return,
        booking,
        returned,
        actor_id,
        now,
        Some(audit::direct_note(None)),
    );
    plan.device_moves = dedup_ids(&booking.device_ids)
        .into_iter()
        .map(|device_id| DeviceMove {
            device_id,
            location: DeviceLocation::Warehouse,
            room_id: None,
            condition: DeviceCondition::Ready,
        })
        .collect();

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceCategory;
    use crate::scheduling::{fixtures::*, Conflict};

    fn request(room_id: i32, requester_id: i32, from: (u32, u32), to: (u32, u32)) -> NewBooking {
        NewBooking {
            room_id,
            requester_id,
            window: window(from, to),
            device_ids: vec![],
            note: None,
        }
    }

    #[test]
    fn test_submit_allows_overlapping_pending() {
        let existing = vec![booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending)];
        let plan = plan_submit(&request(10, 101, (9, 30), (10, 30)), &[], &existing, 101, at(8, 0))
            .unwrap();
        assert_eq!(plan.audit.action, AuditAction::Create);
        assert!(plan.device_ids.is_empty());
    }

    #[test]
    fn test_submit_blocked_by_committed_room() {
        let existing = vec![booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Approved)];
        let err = plan_submit(&request(10, 101, (9, 30), (10, 30)), &[], &existing, 101, at(8, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Conflict(Conflict::RoomBooked { blocking_booking_id: 1, .. })
        ));
    }

    #[test]
    fn test_submit_drops_built_in_devices() {
        let devices = vec![
            warehouse_device(1, DeviceCategory::Microphone),
            built_in_device(2, DeviceCategory::Projector, 10),
        ];
        let mut req = request(10, 100, (9, 0), (10, 0));
        req.device_ids = vec![2, 1, 1];
        let plan = plan_submit(&req, &devices, &[], 100, at(8, 0)).unwrap();
        assert_eq!(plan.device_ids, vec![1]);
        assert_eq!(plan.built_in_ids, vec![2]);
        assert!(plan.audit.note.unwrap().contains("built-in devices not reserved: 2"));
    }

    #[test]
    fn test_submit_blocked_by_device_held_elsewhere() {
        let devices = vec![warehouse_device(1, DeviceCategory::Microphone)];
        let mut holder = booking(7, 11, 200, window((9, 0), (10, 0)), BookingStatus::Pending);
        holder.device_ids = vec![1];
        let mut req = request(10, 100, (9, 30), (10, 30));
        req.device_ids = vec![1];
        let err = plan_submit(&req, &devices, &[holder], 100, at(8, 0)).unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Conflict(Conflict::DeviceBooked { blocking_booking_id: 7, .. })
        ));
    }

    #[test]
    fn test_submit_rejects_unknown_device() {
        let mut req = request(10, 100, (9, 0), (10, 0));
        req.device_ids = vec![99];
        assert!(matches!(
            plan_submit(&req, &[], &[], 100, at(8, 0)),
            Err(SchedulingError::Validation(_))
        ));
    }

    #[test]
    fn test_approve_cascades_room_conflict() {
        let b1 = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending);
        let b2 = booking(2, 10, 101, window((9, 30), (10, 30)), BookingStatus::Pending);
        let existing = vec![b1.clone(), b2];

        let plan = plan_approve(&b1, &[], &existing, 5, at(8, 0)).unwrap();

        assert_eq!(plan.booking.status, BookingStatus::Approved);
        assert_eq!(plan.booking.approved_by, Some(5));
        assert_eq!(plan.booking.approved_at, Some(at(8, 0)));
        assert_eq!(plan.cascaded.len(), 1);
        assert_eq!(plan.cascaded[0].id, 2);
        assert_eq!(plan.cascaded[0].status, BookingStatus::Cancelled);

        assert_eq!(plan.audit.len(), 2);
        let cascade = &plan.audit[1];
        assert_eq!(cascade.booking_id, Some(2));
        assert_eq!(cascade.action, AuditAction::AutoCancel);
        assert_eq!(cascade.status_before, Some(BookingStatus::Pending));
        assert!(cascade.note.as_deref().unwrap().contains("room conflict"));
    }

    #[test]
    fn test_approve_cascades_requester_conflict_in_other_rooms() {
        let b1 = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending);
        let same_requester = booking(2, 11, 100, window((9, 30), (10, 30)), BookingStatus::Pending);
        let other_requester = booking(3, 11, 101, window((9, 30), (10, 30)), BookingStatus::Pending);
        let later = booking(4, 12, 100, window((10, 0), (11, 0)), BookingStatus::Pending);
        let existing = vec![b1.clone(), same_requester, other_requester, later];

        let plan = plan_approve(&b1, &[], &existing, 5, at(8, 0)).unwrap();

        let ids: Vec<i32> = plan.cascaded.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(plan.audit[1].note.as_deref().unwrap().contains("requester conflict"));
    }

    #[test]
    fn test_booking_matching_both_cascades_once_as_room_conflict() {
        let b1 = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending);
        let both = booking(2, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending);
        let plan = plan_approve(&b1, &[], &[b1.clone(), both], 5, at(8, 0)).unwrap();
        assert_eq!(plan.cascaded.len(), 1);
        assert_eq!(plan.audit.len(), 2);
        assert!(plan.audit[1].note.as_deref().unwrap().contains("room conflict"));
    }

    #[test]
    fn test_approve_blocked_by_committed_booking() {
        let b1 = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending);
        let b2 = booking(2, 10, 101, window((9, 30), (10, 30)), BookingStatus::Approved);
        let err = plan_approve(&b1, &[], &[b1.clone(), b2], 5, at(8, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::Conflict(Conflict::RoomBooked { .. })));
    }

    #[test]
    fn test_cancel_forbidden_once_in_use() {
        let b = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::InUse);
        for transition in [Transition::Cancel, Transition::Reject] {
            let err = plan_cancel(&b, transition, 5, at(9, 30), None).unwrap_err();
            assert_eq!(
                err,
                SchedulingError::InvalidState {
                    booking_id: 1,
                    status: BookingStatus::InUse,
                    action: transition,
                }
            );
        }
    }

    #[test]
    fn test_cancel_from_approved_records_reason() {
        let b = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Approved);
        let plan = plan_cancel(&b, Transition::Cancel, 100, at(8, 0), Some("meeting moved")).unwrap();
        assert_eq!(plan.booking.status, BookingStatus::Cancelled);
        assert_eq!(plan.audit[0].action, AuditAction::Cancel);
        assert_eq!(plan.audit[0].note.as_deref(), Some("direct action: meeting moved"));
    }

    #[test]
    fn test_terminal_states_admit_no_transition() {
        for status in [BookingStatus::Cancelled, BookingStatus::Returned] {
            let b = booking(1, 10, 100, window((9, 0), (10, 0)), status);
            assert!(plan_approve(&b, &[], &[], 5, at(8, 0)).is_err());
            assert!(plan_cancel(&b, Transition::Cancel, 5, at(8, 0), None).is_err());
            assert!(plan_cancel(&b, Transition::Reject, 5, at(8, 0), None).is_err());
            assert!(plan_begin_use(&b, &[], &[], 5, at(8, 0)).is_err());
            assert!(plan_return(&b, 5, at(8, 0)).is_err());
        }
    }

    #[test]
    fn test_second_begin_use_in_room_fails() {
        let first = booking(1, 10, 100, window((8, 0), (9, 0)), BookingStatus::InUse);
        let second = booking(2, 10, 101, window((9, 0), (10, 0)), BookingStatus::Approved);
        let err = plan_begin_use(&second, &[], &[first, second.clone()], 101, at(9, 0)).unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Conflict(Conflict::RoomInUse { blocking_booking_id: 1, .. })
        ));
    }

    #[test]
    fn test_begin_use_moves_devices_into_room() {
        let mut b = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Approved);
        b.device_ids = vec![3];
        let devices = vec![warehouse_device(3, DeviceCategory::Speaker)];
        let plan = plan_begin_use(&b, &devices, &[b.clone()], 100, at(9, 5)).unwrap();
        assert_eq!(plan.booking.status, BookingStatus::InUse);
        assert_eq!(plan.booking.actual_start, Some(at(9, 5)));
        assert_eq!(
            plan.device_moves,
            vec![DeviceMove {
                device_id: 3,
                location: DeviceLocation::InRoom,
                room_id: Some(10),
                condition: DeviceCondition::InUse,
            }]
        );
    }

    #[test]
    fn test_begin_use_revalidates_device_condition() {
        let mut b = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Approved);
        b.device_ids = vec![3];
        let mut broken = warehouse_device(3, DeviceCategory::Speaker);
        broken.condition = DeviceCondition::Broken;
        let err = plan_begin_use(&b, &[broken], &[b.clone()], 100, at(9, 5)).unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Conflict(Conflict::DeviceNotReady { device_id: 3, .. })
        ));
    }

    #[test]
    fn test_return_releases_devices_and_backfills_start() {
        let mut b = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::InUse);
        b.device_ids = vec![3, 4];
        let plan = plan_return(&b, 100, at(10, 15)).unwrap();
        assert_eq!(plan.booking.status, BookingStatus::Returned);
        assert_eq!(plan.booking.actual_start, Some(at(9, 0)));
        assert_eq!(plan.booking.actual_end, Some(at(10, 15)));
        assert!(plan
            .device_moves
            .iter()
            .all(|m| m.location == DeviceLocation::Warehouse && m.condition == DeviceCondition::Ready));
        assert_eq!(plan.device_moves.len(), 2);
    }
}
