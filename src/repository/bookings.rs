//! Bookings repository for database operations

use chrono::NaiveDateTime;
use sqlx::{postgres::PgRow, FromRow, PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Booking, BookingDetails, BookingStatus, NewBooking},
    scheduling::TimeWindow,
};

/// Booking columns, with the reserved devices folded into `device_ids`
const BOOKING_COLUMNS: &str = r#"
    b.id, b.room_id, b.requester_id,
    ARRAY(SELECT bd.device_id FROM booking_devices bd
          WHERE bd.booking_id = b.id ORDER BY bd.device_id) AS device_ids,
    b.planned_start, b.planned_end, b.actual_start, b.actual_end,
    b.status, b.approved_by, b.approved_at, b.created_at
"#;

/// Filters for booking listing; `None` matches everything
#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub room_id: Option<i32>,
    pub requester_id: Option<i32>,
    pub status: Option<BookingStatus>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

/// What a state change has to be checked against
#[derive(Debug, Clone)]
pub struct ConflictScope<'a> {
    pub room_id: i32,
    pub requester_id: i32,
    pub window: TimeWindow,
    pub device_ids: &'a [i32],
}

fn details_from_row(row: &PgRow) -> Result<BookingDetails, sqlx::Error> {
    use sqlx::Row;

    let booking = Booking::from_row(row)?;
    Ok(BookingDetails::new(
        booking,
        row.try_get("room_name")?,
        row.try_get("requester_name")?,
    ))
}

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn details_query(filter: &str) -> String {
        format!(
            r#"
            SELECT {}, r.name AS room_name, e.full_name AS requester_name
            FROM bookings b
            JOIN rooms r ON r.id = b.room_id
            JOIN employees e ON e.id = b.requester_id
            {}
            "#,
            BOOKING_COLUMNS, filter
        )
    }

    /// List bookings, earliest planned start first
    pub async fn list(&self, filter: &BookingFilter) -> AppResult<Vec<BookingDetails>> {
        let query = Self::details_query(
            r#"
            WHERE ($1::int IS NULL OR b.room_id = $1)
              AND ($2::int IS NULL OR b.requester_id = $2)
              AND ($3::text IS NULL OR b.status = $3)
              AND ($4::timestamp IS NULL OR b.planned_end > $4)
              AND ($5::timestamp IS NULL OR b.planned_start < $5)
            ORDER BY b.planned_start, b.id
            "#,
        );

        let rows = sqlx::query(&query)
            .bind(filter.room_id)
            .bind(filter.requester_id)
            .bind(filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(&self.pool)
            .await?;

        let bookings = rows
            .iter()
            .map(details_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bookings)
    }

    /// Get booking by ID, with room and requester names
    pub async fn get_details(&self, id: i32) -> AppResult<BookingDetails> {
        let row = sqlx::query(&Self::details_query("WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;
        Ok(details_from_row(&row)?)
    }

    /// Lock the booking row for the rest of the transaction
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM bookings b WHERE b.id = $1 FOR UPDATE OF b",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Active bookings a state change in `scope` must be checked against:
    /// every active booking of the room, the requester's overlapping pending
    /// bookings and the active bookings holding any of the devices.
    pub async fn conflict_snapshot(
        &self,
        conn: &mut PgConnection,
        scope: &ConflictScope<'_>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {} FROM bookings b
            WHERE b.status IN ('pending', 'approved', 'in_use')
              AND (
                  b.room_id = $1
                  OR (b.requester_id = $2 AND b.status = 'pending'
                      AND b.planned_start < $4 AND $3 < b.planned_end)
                  OR EXISTS (SELECT 1 FROM booking_devices bd
                             WHERE bd.booking_id = b.id AND bd.device_id = ANY($5))
              )
            ORDER BY b.id
            "#,
            BOOKING_COLUMNS
        ))
        .bind(scope.room_id)
        .bind(scope.requester_id)
        .bind(scope.window.start)
        .bind(scope.window.end)
        .bind(scope.device_ids)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Active bookings overlapping `[from, to)`
    pub async fn active_overlapping(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {} FROM bookings b
            WHERE b.status IN ('pending', 'approved', 'in_use')
              AND b.planned_start < $2 AND $1 < b.planned_end
            ORDER BY b.id
            "#,
            BOOKING_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Returned bookings of a room whose actual usage intersects `[from, to)`
    pub async fn returned_between(
        &self,
        room_id: i32,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {} FROM bookings b
            WHERE b.room_id = $1 AND b.status = 'returned'
              AND b.actual_start < $3 AND $2 < b.actual_end
            ORDER BY b.actual_start, b.id
            "#,
            BOOKING_COLUMNS
        ))
        .bind(room_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert a pending booking and its reserved devices
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        booking: &NewBooking,
        device_ids: &[i32],
        now: NaiveDateTime,
    ) -> AppResult<Booking> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO bookings (room_id, requester_id, planned_start, planned_end, status, created_at)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING id
            "#,
        )
        .bind(booking.room_id)
        .bind(booking.requester_id)
        .bind(booking.window.start)
        .bind(booking.window.end)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        if !device_ids.is_empty() {
            sqlx::query(
                "INSERT INTO booking_devices (booking_id, device_id) SELECT $1, UNNEST($2::int[])",
            )
            .bind(id)
            .bind(device_ids)
            .execute(&mut *conn)
            .await?;
        }

        self.lock(conn, id).await
    }

    /// Persist a booking's new state, provided it is still in `expected`.
    pub async fn update_state(
        &self,
        conn: &mut PgConnection,
        booking: &Booking,
        expected: BookingStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = $2, actual_start = $3, actual_end = $4,
                approved_by = $5, approved_at = $6
            WHERE id = $1 AND status = $7
            "#,
        )
        .bind(booking.id)
        .bind(booking.status)
        .bind(booking.actual_start)
        .bind(booking.actual_end)
        .bind(booking.approved_by)
        .bind(booking.approved_at)
        .bind(expected)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ConcurrentUpdate(format!(
                "Booking {} is no longer {}",
                booking.id, expected
            )));
        }
        Ok(())
    }
}
