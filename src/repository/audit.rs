//! Booking audit trail persistence (append-only)

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::AppResult,
    models::{AuditRecord, NewAuditRecord},
};

#[derive(Clone)]
pub struct AuditRepository {
    pool: Pool<Postgres>,
}

impl AuditRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append one record. `booking_id` fills in the creation record, whose id
    /// was unknown when it was emitted.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        record: &NewAuditRecord,
        booking_id: i32,
    ) -> AppResult<AuditRecord> {
        let row = sqlx::query_as::<_, AuditRecord>(
            r#"
            INSERT INTO booking_audit
                (booking_id, room_id, requester_id, planned_start, planned_end,
                 action, status_before, status_after, actor_id, recorded_at, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(record.booking_id.unwrap_or(booking_id))
        .bind(record.room_id)
        .bind(record.requester_id)
        .bind(record.planned_start)
        .bind(record.planned_end)
        .bind(record.action)
        .bind(record.status_before)
        .bind(record.status_after)
        .bind(record.actor_id)
        .bind(record.recorded_at)
        .bind(&record.note)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Audit trail of one booking, newest first
    pub async fn list_for_booking(&self, booking_id: i32) -> AppResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRecord>(
            "SELECT * FROM booking_audit WHERE booking_id = $1 ORDER BY recorded_at DESC, id DESC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Audit trail of every booking of a room, newest first
    pub async fn list_for_room(&self, room_id: i32) -> AppResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRecord>(
            "SELECT * FROM booking_audit WHERE room_id = $1 ORDER BY recorded_at DESC, id DESC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
