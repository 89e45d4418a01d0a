//! Booking assistant: free-text request to room suggestion, and booking the
//! suggestion once the user confirms it.

use chrono::{Duration, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use super::{bookings::BookingsService, now};
use crate::{
    config::SchedulingConfig,
    error::{AppError, AppResult},
    models::{BookingDetails, NewBooking},
    repository::Repository,
    scheduling::{
        intent::{IntentExtractor, Requirement},
        scanner::{AvailabilitySnapshot, Suggestion},
        SchedulingError,
    },
};

/// A suggestion together with the booking submitted from it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssistantBooking {
    pub suggestion: Suggestion,
    pub booking: BookingDetails,
}

#[derive(Clone)]
pub struct AssistantService {
    repository: Repository,
    bookings: BookingsService,
    config: SchedulingConfig,
}

impl AssistantService {
    pub fn new(repository: Repository, bookings: BookingsService, config: SchedulingConfig) -> Self {
        Self {
            repository,
            bookings,
            config,
        }
    }

    /// Parse a request against today's date
    pub fn parse(&self, text: &str) -> AppResult<Requirement> {
        let extractor = IntentExtractor::new(now().date(), self.config.default_duration());
        Ok(extractor.extract(text)?)
    }

    pub async fn suggest(&self, text: &str) -> AppResult<Suggestion> {
        let requirement = self.parse(text)?;
        self.suggest_for(requirement).await
    }

    /// Rank rooms for a parsed requirement and scan its day
    pub async fn suggest_for(&self, requirement: Requirement) -> AppResult<Suggestion> {
        // Every booking that may overlap a scanned slot, including slots
        // running past midnight
        let day_start = requirement.date.and_time(NaiveTime::MIN);
        let from = day_start.min(requirement.window.start);
        let to = (day_start + Duration::days(1) + requirement.duration()).max(requirement.window.end);

        let snapshot = AvailabilitySnapshot::new(
            self.repository.rooms.list_all().await?,
            self.repository.devices.list_all().await?,
            self.repository.bookings.active_overlapping(from, to).await?,
        );

        let options = self.config.scan_options();
        let top_rooms = self.config.suggested_rooms;

        let suggestion = tokio::task::spawn_blocking(move || {
            snapshot.suggest(requirement, &options, top_rooms)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Suggestion worker failed: {}", e)))?;

        tracing::debug!(
            rooms = suggestion.rooms.len(),
            slots = suggestion.slots.len(),
            recommended = ?suggestion.recommended.as_ref().map(|r| r.room_id),
            "Suggestion computed"
        );

        Ok(suggestion)
    }

    /// Submit a booking for the recommended room with the suggested
    /// warehouse devices.
    pub async fn book(&self, text: &str, requester_id: i32, actor_id: i32) -> AppResult<AssistantBooking> {
        let suggestion = self.suggest(text).await?;

        let room = suggestion.recommended.as_ref().ok_or_else(|| {
            SchedulingError::Validation(format!(
                "no room is available for {}",
                suggestion.requirement.window
            ))
        })?;

        let request = NewBooking {
            room_id: room.room_id,
            requester_id,
            window: suggestion.requirement.window,
            device_ids: suggestion.devices.borrow.iter().map(|d| d.id).collect(),
            note: Some(format!("booked from request: {}", text.trim())),
        };

        let booking = self.bookings.submit(request, actor_id).await?;
        Ok(AssistantBooking { suggestion, booking })
    }
}
