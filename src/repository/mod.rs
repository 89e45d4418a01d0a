//! Repository layer for database operations
//!
//! Reads that feed a state change take a `&mut PgConnection` so they run
//! inside the caller's transaction; plain listings go through the pool.

pub mod audit;
pub mod bookings;
pub mod devices;
pub mod employees;
pub mod rooms;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub rooms: rooms::RoomsRepository,
    pub devices: devices::DevicesRepository,
    pub bookings: bookings::BookingsRepository,
    pub audit: audit::AuditRepository,
    pub employees: employees::EmployeesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            rooms: rooms::RoomsRepository::new(pool.clone()),
            devices: devices::DevicesRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            audit: audit::AuditRepository::new(pool.clone()),
            employees: employees::EmployeesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Database round-trip, used by the readiness probe
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
