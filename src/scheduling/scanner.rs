//! Availability scanner
//!
//! Ranks rooms for a [`Requirement`], picks warehouse devices to cover what
//! the best room lacks, and scans a whole day for alternative slots. All of it
//! is advisory and read-only: it runs over an [`AvailabilitySnapshot`] loaded
//! beforehand and never writes anything.

use std::collections::HashMap;

use chrono::{Duration, NaiveTime};
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::{conflict, intent::Requirement, TimeWindow};
use crate::models::{Booking, Device, DeviceCategory, DeviceLocation, Room, RoomKind};

/// Missing devices outweigh any capacity surplus
const MISSING_DEVICE_WEIGHT: i64 = 100;

/// A feasible room with its score (lower is better)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RankedRoom {
    pub room_id: i32,
    pub name: String,
    pub kind: RoomKind,
    pub capacity: i32,
    pub score: i64,
    /// Required devices not built into the room
    pub missing_devices: u32,
}

/// Warehouse device proposed for a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BorrowedDevice {
    pub id: i32,
    pub name: String,
    pub category: DeviceCategory,
}

/// Category the warehouse cannot fully cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceShortfall {
    pub category: DeviceCategory,
    pub needed: u32,
    pub found: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceSuggestion {
    pub borrow: Vec<BorrowedDevice>,
    pub shortfalls: Vec<DeviceShortfall>,
}

/// One step of a day scan with at least one feasible room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SlotSuggestion {
    pub window: TimeWindow,
    /// Score of the best room
    pub score: i64,
    pub rooms: Vec<RankedRoom>,
    /// This slot is exactly the requested window
    pub requested: bool,
}

/// Day scan bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub from_hour: u32,
    /// Inclusive: steps run up to `to_hour:59`
    pub to_hour: u32,
    pub step_minutes: i64,
    /// Rooms listed per slot
    pub rooms_per_slot: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            from_hour: 0,
            to_hour: 23,
            step_minutes: 30,
            rooms_per_slot: 3,
        }
    }
}

impl ScanOptions {
    /// Bounds clamped to 0–23 and ordered, step of at least five minutes
    fn normalized(&self) -> (u32, u32, Duration) {
        let from = self.from_hour.min(23);
        let to = self.to_hour.min(23);
        let (from, to) = if to < from { (to, from) } else { (from, to) };
        (from, to, Duration::minutes(self.step_minutes.max(5)))
    }
}

/// Full answer to a natural-language request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Suggestion {
    pub requirement: Requirement,
    /// Best rooms for the requested window
    pub rooms: Vec<RankedRoom>,
    pub recommended: Option<RankedRoom>,
    #[serde(flatten)]
    pub devices: DeviceSuggestion,
    /// Feasible slots over the requested day, best first
    pub slots: Vec<SlotSuggestion>,
}

/// Rooms, devices and bookings read in one go
#[derive(Debug, Clone, Default)]
pub struct AvailabilitySnapshot {
    pub rooms: Vec<Room>,
    pub devices: Vec<Device>,
    pub bookings: Vec<Booking>,
}

impl AvailabilitySnapshot {
    pub fn new(rooms: Vec<Room>, devices: Vec<Device>, bookings: Vec<Booking>) -> Self {
        Self {
            rooms,
            devices,
            bookings,
        }
    }

    fn built_in(&self, room_id: i32) -> HashMap<DeviceCategory, u32> {
        let mut counts = HashMap::new();
        for device in self
            .devices
            .iter()
            .filter(|d| d.location == DeviceLocation::InRoom && d.room_id == Some(room_id))
        {
            *counts.entry(device.category).or_insert(0) += 1;
        }
        counts
    }

    /// Required quantity minus what the room already has, per category
    pub fn missing_in_room(
        &self,
        room_id: i32,
        required: &IndexMap<DeviceCategory, u32>,
    ) -> IndexMap<DeviceCategory, u32> {
        let have = self.built_in(room_id);
        required
            .iter()
            .map(|(category, need)| {
                (*category, need.saturating_sub(have.get(category).copied().unwrap_or(0)))
            })
            .filter(|(_, missing)| *missing > 0)
            .collect()
    }

    fn score(&self, room: &Room, attendees: Option<u32>, required: &IndexMap<DeviceCategory, u32>) -> RankedRoom {
        let missing_devices: u32 = self.missing_in_room(room.id, required).values().sum();
        let surplus = attendees.map_or(0, |n| (i64::from(room.capacity) - i64::from(n)).max(0));
        RankedRoom {
            room_id: room.id,
            name: room.name.clone(),
            kind: room.kind,
            capacity: room.capacity,
            score: i64::from(missing_devices) * MISSING_DEVICE_WEIGHT + surplus,
            missing_devices,
        }
    }

    /// Active rooms big enough and not committed elsewhere in `window`, best first
    pub fn rank_rooms(
        &self,
        attendees: Option<u32>,
        required: &IndexMap<DeviceCategory, u32>,
        window: &TimeWindow,
    ) -> Vec<RankedRoom> {
        let busy = conflict::busy_room_ids(&self.bookings, window);

        let mut ranked: Vec<RankedRoom> = self
            .rooms
            .iter()
            .filter(|room| room.active)
            .filter(|room| attendees.map_or(true, |n| i64::from(room.capacity) >= i64::from(n)))
            .filter(|room| !busy.contains(&room.id))
            .map(|room| self.score(room, attendees, required))
            .collect();

        ranked.sort_by_key(|r| (r.score, r.capacity, r.room_id));
        ranked
    }

    /// Cover what `room_id` lacks (or everything, without a room) from the
    /// warehouse, lowest device id first.
    pub fn suggest_devices(
        &self,
        room_id: Option<i32>,
        required: &IndexMap<DeviceCategory, u32>,
        window: &TimeWindow,
    ) -> DeviceSuggestion {
        let missing = match room_id {
            Some(room_id) => self.missing_in_room(room_id, required),
            None => required.clone(),
        };

        let mut free: Vec<&Device> = self
            .devices
            .iter()
            .filter(|d| d.is_warehouse_ready())
            .filter(|d| conflict::is_device_free(&self.bookings, d.id, window))
            .collect();
        free.sort_by_key(|d| d.id);

        let mut suggestion = DeviceSuggestion::default();
        for (category, needed) in missing {
            let taken: Vec<BorrowedDevice> = free
                .iter()
                .filter(|d| d.category == category)
                .take(needed as usize)
                .map(|d| BorrowedDevice {
                    id: d.id,
                    name: d.name.clone(),
                    category: d.category,
                })
                .collect();

            let found = taken.len() as u32;
            if found < needed {
                suggestion.shortfalls.push(DeviceShortfall {
                    category,
                    needed,
                    found,
                });
            }
            suggestion.borrow.extend(taken);
        }

        suggestion
    }

    /// Slide a window of the requested duration across the requested day.
    pub fn scan_day(&self, requirement: &Requirement, options: &ScanOptions) -> Vec<SlotSuggestion> {
        let (from_hour, to_hour, step) = options.normalized();
        let duration = requirement.duration();

        let (Some(first), Some(last)) = (
            NaiveTime::from_hms_opt(from_hour, 0, 0),
            NaiveTime::from_hms_opt(to_hour, 59, 0),
        ) else {
            return Vec::new();
        };
        let mut cursor = requirement.date.and_time(first);
        let last = requirement.date.and_time(last);

        let mut slots = Vec::new();
        while cursor <= last {
            let window = TimeWindow {
                start: cursor,
                end: cursor + duration,
            };
            let ranked = self.rank_rooms(requirement.attendees, &requirement.devices, &window);
            if let Some(best) = ranked.first() {
                slots.push(SlotSuggestion {
                    window,
                    score: best.score,
                    requested: window == requirement.window,
                    rooms: ranked.into_iter().take(options.rooms_per_slot).collect(),
                });
            }
            cursor += step;
        }

        slots.sort_by_key(|s| (s.score, s.window.start));
        slots
    }

    /// Rank rooms for the requested window, equip the best one and list the
    /// day's alternatives.
    pub fn suggest(&self, requirement: Requirement, options: &ScanOptions, top_rooms: usize) -> Suggestion {
        let ranked = self.rank_rooms(requirement.attendees, &requirement.devices, &requirement.window);
        let recommended = ranked.first().cloned();
        let devices = self.suggest_devices(
            recommended.as_ref().map(|r| r.room_id),
            &requirement.devices,
            &requirement.window,
        );
        let slots = self.scan_day(&requirement, options);

        Suggestion {
            rooms: ranked.into_iter().take(top_rooms).collect(),
            recommended,
            devices,
            slots,
            requirement,
        }
    }
}
