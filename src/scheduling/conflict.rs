//! Conflict detector
//!
//! Pure predicates over a snapshot of existing bookings. Callers may pass a
//! superset of the relevant bookings; every check filters by room, device,
//! status and window itself. When several bookings block, the one starting
//! first (then lowest id) is reported.

use std::collections::BTreeSet;

use super::{Conflict, TimeWindow};
use crate::models::{Booking, BookingStatus, Device};

/// Which existing bookings block a room.
///
/// Both variants block on committed (`approved` / `in_use`) bookings only;
/// overlapping `pending` requests are allowed so a human can pick one. The
/// variants name the moment of evaluation: lenient at submission, strict at
/// approval and start of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPolicy {
    Lenient,
    Strict,
}

impl RoomPolicy {
    fn blocks(self, status: BookingStatus) -> bool {
        match self {
            RoomPolicy::Lenient | RoomPolicy::Strict => status.is_committed(),
        }
    }
}

/// Devices listed on a booking, split by where they come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSelection {
    /// Taken from the warehouse pool; these are reserved by the booking
    pub warehouse: Vec<i32>,
    /// Already inside the booked room; never listed on the booking
    pub built_in: Vec<i32>,
}

fn first_by_start<'a>(iter: impl Iterator<Item = &'a Booking>) -> Option<&'a Booking> {
    iter.min_by_key(|b| (b.planned_start, b.id))
}

/// Room policy: no committed booking of `room_id` may overlap `window`.
pub fn check_room(
    policy: RoomPolicy,
    bookings: &[Booking],
    room_id: i32,
    window: &TimeWindow,
    exclude: Option<i32>,
) -> Result<(), Conflict> {
    let blocking = first_by_start(bookings.iter().filter(|b| {
        Some(b.id) != exclude
            && b.room_id == room_id
            && policy.blocks(b.status)
            && b.window().overlaps(window)
    }));

    match blocking {
        Some(b) => Err(Conflict::RoomBooked {
            room_id,
            blocking_booking_id: b.id,
            blocking_status: b.status,
            blocking_window: b.window(),
        }),
        None => Ok(()),
    }
}

/// Device policy: no other active booking overlapping `window` may reference
/// any of `devices`. A device is a single physical unit, so pending requests
/// block too.
pub fn check_devices(
    bookings: &[Booking],
    devices: &[Device],
    window: &TimeWindow,
    exclude: Option<i32>,
) -> Result<(), Conflict> {
    if devices.is_empty() {
        return Ok(());
    }

    let requested: BTreeSet<i32> = devices.iter().map(|d| d.id).collect();

    let blocking = first_by_start(bookings.iter().filter(|b| {
        Some(b.id) != exclude
            && b.status.is_active()
            && b.window().overlaps(window)
            && b.device_ids.iter().any(|id| requested.contains(id))
    }));

    match blocking {
        Some(b) => {
            let shared: BTreeSet<i32> = b
                .device_ids
                .iter()
                .copied()
                .filter(|id| requested.contains(id))
                .collect();
            let device_names = devices
                .iter()
                .filter(|d| shared.contains(&d.id))
                .map(|d| d.name.clone())
                .collect();
            Err(Conflict::DeviceBooked {
                blocking_booking_id: b.id,
                blocking_window: b.window(),
                device_ids: shared.into_iter().collect(),
                device_names,
            })
        }
        None => Ok(()),
    }
}

/// Device readiness: each device must either sit in the warehouse in `ready`
/// condition, or already be built into `room_id`.
pub fn check_readiness(devices: &[Device], room_id: i32) -> Result<DeviceSelection, Conflict> {
    let mut selection = DeviceSelection::default();

    for device in devices {
        if device.is_built_into(room_id) {
            selection.built_in.push(device.id);
        } else if device.is_warehouse_ready() {
            selection.warehouse.push(device.id);
        } else {
            return Err(Conflict::DeviceNotReady {
                device_id: device.id,
                device_name: device.name.clone(),
                location: device.location,
                condition: device.condition,
            });
        }
    }

    Ok(selection)
}

/// Actual usage is exclusive per room, whatever the planned windows say.
pub fn check_room_idle(bookings: &[Booking], room_id: i32, exclude: Option<i32>) -> Result<(), Conflict> {
    match bookings
        .iter()
        .filter(|b| Some(b.id) != exclude && b.room_id == room_id && b.status == BookingStatus::InUse)
        .min_by_key(|b| b.id)
    {
        Some(b) => Err(Conflict::RoomInUse {
            room_id,
            blocking_booking_id: b.id,
        }),
        None => Ok(()),
    }
}

/// Rooms with a committed booking overlapping `window`
pub fn busy_room_ids(bookings: &[Booking], window: &TimeWindow) -> BTreeSet<i32> {
    bookings
        .iter()
        .filter(|b| b.status.is_committed() && b.window().overlaps(window))
        .map(|b| b.room_id)
        .collect()
}

/// Whether `device_id` is unreserved by every active booking overlapping `window`
pub fn is_device_free(bookings: &[Booking], device_id: i32, window: &TimeWindow) -> bool {
    !bookings.iter().any(|b| {
        b.status.is_active() && b.window().overlaps(window) && b.references_device(device_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceCategory, DeviceCondition};
    use crate::scheduling::fixtures::*;

    #[test]
    fn test_pending_overlap_does_not_block_room() {
        let existing = vec![booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending)];
        let result = check_room(RoomPolicy::Lenient, &existing, 10, &window((9, 30), (10, 30)), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_committed_overlap_blocks_room() {
        for status in [BookingStatus::Approved, BookingStatus::InUse] {
            let existing = vec![booking(1, 10, 100, window((9, 0), (10, 0)), status)];
            let err = check_room(RoomPolicy::Strict, &existing, 10, &window((9, 30), (10, 30)), None)
                .unwrap_err();
            assert_eq!(
                err,
                Conflict::RoomBooked {
                    room_id: 10,
                    blocking_booking_id: 1,
                    blocking_status: status,
                    blocking_window: window((9, 0), (10, 0)),
                }
            );
        }
    }

    #[test]
    fn test_room_check_ignores_other_rooms_adjacent_windows_and_self() {
        let existing = vec![
            booking(1, 11, 100, window((9, 0), (10, 0)), BookingStatus::Approved),
            booking(2, 10, 100, window((10, 0), (11, 0)), BookingStatus::Approved),
            booking(3, 10, 100, window((9, 0), (10, 0)), BookingStatus::Approved),
            booking(4, 10, 100, window((9, 0), (10, 0)), BookingStatus::Cancelled),
        ];
        let result = check_room(RoomPolicy::Strict, &existing, 10, &window((9, 0), (10, 0)), Some(3));
        assert!(result.is_ok());
    }

    #[test]
    fn test_room_conflict_reports_earliest_blocker() {
        let existing = vec![
            booking(5, 10, 100, window((9, 30), (10, 0)), BookingStatus::Approved),
            booking(6, 10, 100, window((9, 0), (9, 30)), BookingStatus::Approved),
        ];
        let err = check_room(RoomPolicy::Lenient, &existing, 10, &window((9, 0), (10, 0)), None)
            .unwrap_err();
        assert!(matches!(err, Conflict::RoomBooked { blocking_booking_id: 6, .. }));
    }

    #[test]
    fn test_device_held_by_any_active_booking() {
        let projector = warehouse_device(50, DeviceCategory::Projector);
        for status in [BookingStatus::Pending, BookingStatus::Approved, BookingStatus::InUse] {
            let mut holder = booking(1, 11, 100, window((9, 0), (10, 0)), status);
            holder.device_ids = vec![50, 51];
            let err = check_devices(&[holder], &[projector.clone()], &window((9, 30), (11, 0)), None)
                .unwrap_err();
            match err {
                Conflict::DeviceBooked {
                    blocking_booking_id,
                    device_ids,
                    device_names,
                    ..
                } => {
                    assert_eq!(blocking_booking_id, 1);
                    assert_eq!(device_ids, vec![50]);
                    assert_eq!(device_names, vec!["Device 50".to_string()]);
                }
                other => panic!("unexpected conflict {:?}", other),
            }
        }
    }

    #[test]
    fn test_device_released_by_terminal_bookings() {
        let projector = warehouse_device(50, DeviceCategory::Projector);
        let mut done = booking(1, 11, 100, window((9, 0), (10, 0)), BookingStatus::Returned);
        done.device_ids = vec![50];
        let mut dropped = booking(2, 11, 100, window((9, 0), (10, 0)), BookingStatus::Cancelled);
        dropped.device_ids = vec![50];
        assert!(check_devices(&[done, dropped], &[projector], &window((9, 0), (10, 0)), None).is_ok());
    }

    #[test]
    fn test_readiness_splits_warehouse_and_built_in() {
        let devices = vec![
            warehouse_device(1, DeviceCategory::Microphone),
            built_in_device(2, DeviceCategory::Projector, 10),
        ];
        let selection = check_readiness(&devices, 10).unwrap();
        assert_eq!(selection.warehouse, vec![1]);
        assert_eq!(selection.built_in, vec![2]);
    }

    #[test]
    fn test_readiness_rejects_broken_or_elsewhere() {
        let mut broken = warehouse_device(1, DeviceCategory::Microphone);
        broken.condition = DeviceCondition::Broken;
        assert!(matches!(
            check_readiness(&[broken], 10),
            Err(Conflict::DeviceNotReady { device_id: 1, .. })
        ));

        let other_room = built_in_device(2, DeviceCategory::Projector, 11);
        assert!(matches!(
            check_readiness(&[other_room], 10),
            Err(Conflict::DeviceNotReady { device_id: 2, .. })
        ));
    }

    #[test]
    fn test_room_idle_is_window_independent() {
        let existing = vec![booking(1, 10, 100, window((7, 0), (8, 0)), BookingStatus::InUse)];
        assert!(matches!(
            check_room_idle(&existing, 10, Some(2)),
            Err(Conflict::RoomInUse { blocking_booking_id: 1, .. })
        ));
        assert!(check_room_idle(&existing, 11, None).is_ok());
    }

    #[test]
    fn test_busy_rooms_and_free_devices() {
        let mut held = booking(1, 10, 100, window((9, 0), (10, 0)), BookingStatus::Pending);
        held.device_ids = vec![7];
        let existing = vec![
            held,
            booking(2, 11, 100, window((9, 0), (10, 0)), BookingStatus::Approved),
        ];
        let w = window((9, 30), (10, 30));
        assert_eq!(busy_room_ids(&existing, &w).into_iter().collect::<Vec<_>>(), vec![11]);
        assert!(!is_device_free(&existing, 7, &w));
        assert!(is_device_free(&existing, 7, &window((10, 0), (11, 0))));
    }
}
