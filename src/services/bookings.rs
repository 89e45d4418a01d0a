//! Booking lifecycle service
//!
//! Every state change runs in one SERIALIZABLE transaction: lock the booking,
//! its room and its devices (in that order), read the conflict snapshot, let
//! the scheduling engine plan the change, write the plan, commit.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{Postgres, Transaction};
use utoipa::ToSchema;

use super::now;
use crate::{
    error::{AppError, AppResult},
    models::{
        booking::BookingQuery, timestamp, AuditRecord, Booking, BookingDetails, BookingStatus,
        Device, NewBooking, RoomAvailability, RoomRef,
    },
    repository::{
        bookings::{BookingFilter, ConflictScope},
        Repository,
    },
    scheduling::{
        conflict,
        lifecycle::{self, Transition, TransitionPlan},
        SchedulingResult, TimeWindow,
    },
};

/// Result of a committed transition
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransitionOutcome {
    pub booking: BookingDetails,
    /// Pending bookings auto-cancelled by an approval
    pub cascaded: Vec<Booking>,
    /// Records written by the transition, the booking's own first
    pub audit: Vec<AuditRecord>,
}

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
}

impl BookingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &BookingQuery) -> AppResult<Vec<BookingDetails>> {
        let parse = |field: &str, value: &Option<String>| -> AppResult<Option<NaiveDateTime>> {
            value
                .as_deref()
                .map(|v| timestamp::parse_required(field, Some(v)))
                .transpose()
        };

        let filter = BookingFilter {
            room_id: query.room_id,
            requester_id: query.requester_id,
            status: query.status,
            from: parse("from", &query.from)?,
            to: parse("to", &query.to)?,
        };
        self.repository.bookings.list(&filter).await
    }

    pub async fn get(&self, id: i32) -> AppResult<BookingDetails> {
        self.repository.bookings.get_details(id).await
    }

    /// Audit trail of one booking, newest first
    pub async fn audit(&self, id: i32) -> AppResult<Vec<AuditRecord>> {
        self.repository.bookings.get_details(id).await?;
        self.repository.audit.list_for_booking(id).await
    }

    /// Active rooms with and without a committed booking overlapping `window`
    pub async fn check_availability(&self, window: &TimeWindow) -> AppResult<RoomAvailability> {
        let rooms = self.repository.rooms.list_all().await?;
        let bookings = self
            .repository
            .bookings
            .active_overlapping(window.start, window.end)
            .await?;
        let busy = conflict::busy_room_ids(&bookings, window);

        let (busy, free): (Vec<_>, Vec<_>) = rooms
            .iter()
            .filter(|room| room.active)
            .partition(|room| busy.contains(&room.id));

        Ok(RoomAvailability {
            free: free.into_iter().map(RoomRef::from).collect(),
            busy: busy.into_iter().map(RoomRef::from).collect(),
        })
    }

    /// Create a pending booking
    pub async fn submit(&self, request: NewBooking, actor_id: i32) -> AppResult<BookingDetails> {
        self.ensure_actor(actor_id).await?;
        self.repository.employees.get(request.requester_id).await?;

        let mut device_ids = request.device_ids.clone();
        device_ids.sort_unstable();
        device_ids.dedup();

        let now = now();
        let mut tx = self.begin().await?;

        let room = self.repository.rooms.lock(&mut tx, request.room_id).await?;
        if !room.active {
            return Err(AppError::Validation(format!("Room {} is not active", room.id)));
        }
        let devices = self.repository.devices.lock(&mut tx, &device_ids).await?;
        let existing = self
            .repository
            .bookings
            .conflict_snapshot(
                &mut tx,
                &ConflictScope {
                    room_id: request.room_id,
                    requester_id: request.requester_id,
                    window: request.window,
                    device_ids: &device_ids,
                },
            )
            .await?;

        let plan = lifecycle::plan_submit(&request, &devices, &existing, actor_id, now)?;

        let booking = self
            .repository
            .bookings
            .insert(&mut tx, &request, &plan.device_ids, now)
            .await?;
        self.repository.audit.insert(&mut tx, &plan.audit, booking.id).await?;
        tx.commit().await?;

        tracing::info!(
            booking_id = booking.id,
            action = "create",
            actor_id,
            room_id = booking.room_id,
            devices = plan.device_ids.len(),
            built_in = plan.built_in_ids.len(),
            "Booking submitted"
        );

        self.repository.bookings.get_details(booking.id).await
    }

    pub async fn approve(&self, id: i32, actor_id: i32) -> AppResult<TransitionOutcome> {
        self.transition(id, actor_id, |booking, devices, existing, now| {
            lifecycle::plan_approve(booking, devices, existing, actor_id, now)
        })
        .await
    }

    pub async fn reject(&self, id: i32, actor_id: i32, reason: Option<String>) -> AppResult<TransitionOutcome> {
        self.transition(id, actor_id, |booking, _, _, now| {
            lifecycle::plan_cancel(booking, Transition::Reject, actor_id, now, reason.as_deref())
        })
        .await
    }

    pub async fn cancel(&self, id: i32, actor_id: i32, reason: Option<String>) -> AppResult<TransitionOutcome> {
        self.transition(id, actor_id, |booking, _, _, now| {
            lifecycle::plan_cancel(booking, Transition::Cancel, actor_id, now, reason.as_deref())
        })
        .await
    }

    pub async fn begin_use(&self, id: i32, actor_id: i32) -> AppResult<TransitionOutcome> {
        self.transition(id, actor_id, |booking, devices, existing, now| {
            lifecycle::plan_begin_use(booking, devices, existing, actor_id, now)
        })
        .await
    }

    pub async fn return_booking(&self, id: i32, actor_id: i32) -> AppResult<TransitionOutcome> {
        self.transition(id, actor_id, |booking, _, _, now| {
            lifecycle::plan_return(booking, actor_id, now)
        })
        .await
    }

    /// Lock, plan, write and commit one transition of booking `id`
    async fn transition<F>(&self, id: i32, actor_id: i32, plan: F) -> AppResult<TransitionOutcome>
    where
        F: FnOnce(&Booking, &[Device], &[Booking], NaiveDateTime) -> SchedulingResult<TransitionPlan>,
    {
        self.ensure_actor(actor_id).await?;

        let now = now();
        let mut tx = self.begin().await?;

        let booking = self.repository.bookings.lock(&mut tx, id).await?;
        self.repository.rooms.lock(&mut tx, booking.room_id).await?;
        let devices = self.repository.devices.lock(&mut tx, &booking.device_ids).await?;
        let existing = self
            .repository
            .bookings
            .conflict_snapshot(
                &mut tx,
                &ConflictScope {
                    room_id: booking.room_id,
                    requester_id: booking.requester_id,
                    window: booking.window(),
                    device_ids: &booking.device_ids,
                },
            )
            .await?;

        let plan = plan(&booking, &devices, &existing, now)?;
        let (cascaded, audit) = self.apply(&mut tx, &plan).await?;
        tx.commit().await?;

        tracing::info!(
            booking_id = id,
            action = %plan.transition,
            actor_id,
            status = %plan.booking.status,
            cascaded = cascaded.len(),
            "Booking transition committed"
        );

        Ok(TransitionOutcome {
            booking: self.repository.bookings.get_details(id).await?,
            cascaded,
            audit,
        })
    }

    /// Write a plan: status change, cascades, device moves, then audit
    async fn apply(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        plan: &TransitionPlan,
    ) -> AppResult<(Vec<Booking>, Vec<AuditRecord>)> {
        let bookings = &self.repository.bookings;

        bookings.update_state(tx, &plan.booking, plan.status_before).await?;
        for cancelled in &plan.cascaded {
            bookings.update_state(tx, cancelled, BookingStatus::Pending).await?;
        }
        for change in &plan.device_moves {
            self.repository.devices.apply_move(tx, change).await?;
        }

        let mut audit = Vec::with_capacity(plan.audit.len());
        for record in &plan.audit {
            audit.push(self.repository.audit.insert(tx, record, plan.booking.id).await?);
        }

        Ok((plan.cascaded.clone(), audit))
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.repository.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// The acting employee must exist
    async fn ensure_actor(&self, actor_id: i32) -> AppResult<()> {
        match self.repository.employees.get(actor_id).await {
            Ok(_) => Ok(()),
            Err(AppError::NotFound(_)) => Err(AppError::Authentication(format!(
                "Unknown actor {}",
                actor_id
            ))),
            Err(e) => Err(e),
        }
    }
}
