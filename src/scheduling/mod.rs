//! Booking & scheduling engine
//!
//! Pure, I/O-free core: the conflict detector, the booking state machine, the
//! audit emitter, the natural-language intent extractor and the availability
//! scanner. Everything here works on snapshots handed in by the services
//! layer, which is responsible for loading them and writing the results back
//! inside one transaction.

pub mod audit;
pub mod conflict;
pub mod error;
pub mod intent;
pub mod lifecycle;
pub mod scanner;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::timestamp;

pub use error::{Conflict, IntentField, SchedulingError, SchedulingResult};

/// Half-open time interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct TimeWindow {
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String, example = "2026-01-28 09:00:00")]
    pub start: NaiveDateTime,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String, example = "2026-01-28 10:00:00")]
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted intervals.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> SchedulingResult<Self> {
        if start >= end {
            return Err(SchedulingError::Validation(format!(
                "end ({}) must be after start ({})",
                timestamp::format(&end),
                timestamp::format(&start)
            )));
        }
        Ok(Self { start, end })
    }

    pub fn starting_at(start: NaiveDateTime, duration: Duration) -> SchedulingResult<Self> {
        Self::new(start, start + duration)
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            timestamp::format(&self.start),
            timestamp::format(&self.end)
        )
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_window_rejects_inverted_and_empty() {
        assert!(TimeWindow::new(at(10, 0), at(9, 0)).is_err());
        assert!(TimeWindow::new(at(9, 0), at(9, 0)).is_err());
    }

    #[test]
    fn test_half_open_overlap() {
        let a = window((9, 0), (10, 0));
        assert!(a.overlaps(&window((9, 30), (10, 30))));
        assert!(a.overlaps(&window((8, 0), (11, 0))));
        assert!(!a.overlaps(&window((10, 0), (11, 0))));
        assert!(!a.overlaps(&window((8, 0), (9, 0))));
    }
}
