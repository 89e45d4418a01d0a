//! Daily room usage summary, computed from returned bookings

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use super::{booking::Booking, timestamp};

/// One returned booking contributing to a day's usage
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageEntry {
    pub booking_id: i32,
    pub requester_id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub actual_start: NaiveDateTime,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String)]
    pub actual_end: NaiveDateTime,
    /// Seconds of this booking falling inside the day
    pub seconds: i64,
}

/// Usage of one room on one day
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomUsageSummary {
    pub room_id: i32,
    #[schema(value_type = String, example = "2026-01-28")]
    pub date: NaiveDate,
    pub entries: Vec<UsageEntry>,
    pub total_seconds: i64,
    /// `HH:MM:SS`
    pub total: String,
}

impl RoomUsageSummary {
    /// Summarise the returned bookings of `room_id` whose actual usage
    /// intersects `date`, clipping each to the day.
    pub fn compute(room_id: i32, date: NaiveDate, bookings: &[Booking]) -> Self {
        let day_start = date.and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        let mut entries: Vec<UsageEntry> = bookings
            .iter()
            .filter(|b| b.room_id == room_id)
            .filter_map(|b| {
                let (start, end) = (b.actual_start?, b.actual_end?);
                let clipped = (end.min(day_end) - start.max(day_start)).num_seconds();
                (clipped > 0).then(|| UsageEntry {
                    booking_id: b.id,
                    requester_id: b.requester_id,
                    actual_start: start,
                    actual_end: end,
                    seconds: clipped,
                })
            })
            .collect();
        entries.sort_by_key(|e| (e.actual_start, e.booking_id));

        let total_seconds = entries.iter().map(|e| e.seconds).sum();

        Self {
            room_id,
            date,
            entries,
            total_seconds,
            total: format_hms(total_seconds),
        }
    }
}

pub fn format_hms(total_seconds: i64) -> String {
    let (h, rem) = (total_seconds / 3600, total_seconds % 3600);
    format!("{:02}:{:02}:{:02}", h, rem / 60, rem % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::BookingStatus;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn returned(id: i32, start: NaiveDateTime, end: NaiveDateTime) -> Booking {
        Booking {
            id,
            room_id: 1,
            requester_id: 7,
            device_ids: vec![],
            planned_start: start,
            planned_end: end,
            actual_start: Some(start),
            actual_end: Some(end),
            status: BookingStatus::Returned,
            approved_by: Some(1),
            approved_at: Some(start),
            created_at: start,
        }
    }

    #[test]
    fn test_usage_clips_to_day() {
        let bookings = vec![
            returned(1, at(28, 9, 0), at(28, 10, 30)),
            returned(2, at(27, 23, 0), at(28, 0, 30)),
        ];
        let summary = RoomUsageSummary::compute(1, at(28, 0, 0).date(), &bookings);
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.total_seconds, 90 * 60 + 30 * 60);
        assert_eq!(summary.total, "02:00:00");
        assert_eq!(summary.entries[0].booking_id, 2);
    }

    #[test]
    fn test_usage_ignores_other_days() {
        let bookings = vec![returned(1, at(27, 9, 0), at(27, 10, 0))];
        let summary = RoomUsageSummary::compute(1, at(28, 0, 0).date(), &bookings);
        assert!(summary.entries.is_empty());
        assert_eq!(summary.total, "00:00:00");
    }
}
