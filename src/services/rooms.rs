//! Room registry service

use chrono::{Duration, NaiveDate, NaiveTime};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        room::{CreateRoom, UpdateRoom},
        usage::RoomUsageSummary,
        AuditRecord, Device, Room, RoomDetails,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RoomsService {
    repository: Repository,
}

impl RoomsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<RoomDetails>> {
        self.repository.rooms.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<RoomDetails> {
        self.repository.rooms.get_details(id).await
    }

    pub async fn create(&self, data: &CreateRoom) -> AppResult<Room> {
        data.validate()?;
        if self.repository.rooms.name_exists(data.name.trim(), None).await? {
            return Err(AppError::Validation(format!("Room '{}' already exists", data.name.trim())));
        }

        let room = self.repository.rooms.create(data).await?;
        tracing::info!(room_id = room.id, name = %room.name, "Room created");
        Ok(room)
    }

    pub async fn update(&self, id: i32, data: &UpdateRoom) -> AppResult<Room> {
        data.validate()?;
        if let Some(name) = data.name.as_deref().map(str::trim) {
            if self.repository.rooms.name_exists(name, Some(id)).await? {
                return Err(AppError::Validation(format!("Room '{}' already exists", name)));
            }
        }
        self.repository.rooms.update(id, data).await
    }

    /// Equipment built into the room
    pub async fn devices(&self, id: i32) -> AppResult<Vec<Device>> {
        self.repository.rooms.get(id).await?;
        self.repository.devices.list_in_room(id).await
    }

    /// Time the room was actually used on `date`
    pub async fn usage(&self, id: i32, date: NaiveDate) -> AppResult<RoomUsageSummary> {
        self.repository.rooms.get(id).await?;

        let day_start = date.and_time(NaiveTime::MIN);
        let bookings = self
            .repository
            .bookings
            .returned_between(id, day_start, day_start + Duration::days(1))
            .await?;

        Ok(RoomUsageSummary::compute(id, date, &bookings))
    }

    /// Audit trail of every booking of the room, newest first
    pub async fn audit(&self, id: i32) -> AppResult<Vec<AuditRecord>> {
        self.repository.rooms.get(id).await?;
        self.repository.audit.list_for_room(id).await
    }
}
