//! Devices repository (equipment registry)

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::device::{Device, DeviceQuery},
    scheduling::lifecycle::DeviceMove,
};

#[derive(Clone)]
pub struct DevicesRepository {
    pool: Pool<Postgres>,
}

impl DevicesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List devices matching every given filter
    pub async fn list(&self, query: &DeviceQuery) -> AppResult<Vec<Device>> {
        let rows = sqlx::query_as::<_, Device>(
            r#"
            SELECT * FROM devices
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR location = $2)
              AND ($3::text IS NULL OR condition = $3)
              AND ($4::int IS NULL OR room_id = $4)
            ORDER BY id
            "#,
        )
        .bind(query.category)
        .bind(query.location)
        .bind(query.condition)
        .bind(query.room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> AppResult<Device> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))
    }

    /// Devices currently located in a room
    pub async fn list_in_room(&self, room_id: i32) -> AppResult<Vec<Device>> {
        let rows = sqlx::query_as::<_, Device>(
            "SELECT * FROM devices WHERE location = 'in_room' AND room_id = $1 ORDER BY id",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Device>> {
        let rows = sqlx::query_as::<_, Device>("SELECT * FROM devices ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Lock the given devices, in id order so concurrent callers cannot
    /// deadlock on them.
    pub async fn lock(&self, conn: &mut PgConnection, ids: &[i32]) -> AppResult<Vec<Device>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Device>(
            "SELECT * FROM devices WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Check if a fixed-asset id is already linked to another device
    pub async fn asset_linked(&self, asset_id: i32, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM devices WHERE asset_id = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(asset_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a fully resolved device; its `id` is ignored
    pub async fn create(&self, device: &Device) -> AppResult<Device> {
        let row = sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (name, category, location, room_id, condition, asset_id, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&device.name)
        .bind(device.category)
        .bind(device.location)
        .bind(device.room_id)
        .bind(device.condition)
        .bind(device.asset_id)
        .bind(&device.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Overwrite every field of a device locked by the caller
    pub async fn save(&self, conn: &mut PgConnection, device: &Device) -> AppResult<Device> {
        sqlx::query_as::<_, Device>(
            r#"
            UPDATE devices SET
                name = $2, category = $3, location = $4, room_id = $5,
                condition = $6, asset_id = $7, description = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(device.id)
        .bind(&device.name)
        .bind(device.category)
        .bind(device.location)
        .bind(device.room_id)
        .bind(device.condition)
        .bind(device.asset_id)
        .bind(&device.description)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Device {} not found", device.id)))
    }

    /// Every `needs_maintenance` device becomes `ready`, in one statement
    pub async fn complete_maintenance(&self) -> AppResult<Vec<Device>> {
        let rows = sqlx::query_as::<_, Device>(
            r#"
            UPDATE devices SET condition = 'ready'
            WHERE condition = 'needs_maintenance'
            RETURNING *
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Apply a location / condition change decided by a booking transition
    pub async fn apply_move(&self, conn: &mut PgConnection, change: &DeviceMove) -> AppResult<()> {
        sqlx::query("UPDATE devices SET location = $2, room_id = $3, condition = $4 WHERE id = $1")
            .bind(change.device_id)
            .bind(change.location)
            .bind(change.room_id)
            .bind(change.condition)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
