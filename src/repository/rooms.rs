//! Rooms repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::room::{CreateRoom, Room, RoomDetails, RoomStatusRow, UpdateRoom},
    models::RoomKind,
};

/// Room columns plus the two flags the occupancy status is derived from
const ROOM_STATUS_SELECT: &str = r#"
    SELECT r.id, r.name, r.kind, r.capacity, r.active,
           EXISTS(SELECT 1 FROM bookings b
                  WHERE b.room_id = r.id AND b.status = 'in_use') AS has_in_use,
           EXISTS(SELECT 1 FROM bookings b
                  WHERE b.room_id = r.id AND b.status = 'approved') AS has_approved
    FROM rooms r
"#;

#[derive(Clone)]
pub struct RoomsRepository {
    pool: Pool<Postgres>,
}

impl RoomsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List rooms with their derived status
    pub async fn list(&self) -> AppResult<Vec<RoomDetails>> {
        let rows = sqlx::query_as::<_, RoomStatusRow>(&format!("{} ORDER BY r.name", ROOM_STATUS_SELECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RoomDetails::from).collect())
    }

    /// Get one room with its derived status
    pub async fn get_details(&self, id: i32) -> AppResult<RoomDetails> {
        sqlx::query_as::<_, RoomStatusRow>(&format!("{} WHERE r.id = $1", ROOM_STATUS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(RoomDetails::from)
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))
    }

    pub async fn get(&self, id: i32) -> AppResult<Room> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))
    }

    /// Every room, active or not, in id order
    pub async fn list_all(&self) -> AppResult<Vec<Room>> {
        let rows = sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Lock the room row for the rest of the transaction.
    ///
    /// Serialises approve / begin_use calls competing for the same room.
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Room> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))
    }

    /// Check if a room name is already taken
    pub async fn name_exists(&self, name: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM rooms WHERE LOWER(name) = LOWER($1) AND ($2::int IS NULL OR id != $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, data: &CreateRoom) -> AppResult<Room> {
        let row = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (name, kind, capacity, active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.kind.unwrap_or(RoomKind::Room))
        .bind(data.capacity)
        .bind(data.active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the given fields, keeping the others
    pub async fn update(&self, id: i32, data: &UpdateRoom) -> AppResult<Room> {
        sqlx::query_as::<_, Room>(
            r#"
            UPDATE rooms SET
                name = COALESCE($2, name),
                kind = COALESCE($3, kind),
                capacity = COALESCE($4, capacity),
                active = COALESCE($5, active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.kind)
        .bind(data.capacity)
        .bind(data.active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))
    }
}
