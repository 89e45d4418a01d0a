//! Business logic services

pub mod assistant;
pub mod bookings;
pub mod devices;
pub mod rooms;

use chrono::NaiveDateTime;

use crate::{config::SchedulingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub rooms: rooms::RoomsService,
    pub devices: devices::DevicesService,
    pub bookings: bookings::BookingsService,
    pub assistant: assistant::AssistantService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, scheduling: SchedulingConfig) -> Self {
        let bookings = bookings::BookingsService::new(repository.clone());
        Self {
            rooms: rooms::RoomsService::new(repository.clone()),
            devices: devices::DevicesService::new(repository.clone()),
            assistant: assistant::AssistantService::new(repository.clone(), bookings.clone(), scheduling),
            bookings,
            repository,
        }
    }
}

/// Host wall-clock time, naive local
pub(crate) fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
