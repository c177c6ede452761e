use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::{
    Appointment, AppointmentCandidate, AppointmentEdit, AppointmentFilter, AppointmentStatus,
    CONFLICT_REASON, EngineError, ResultEngine, Slot, appointments,
    conflicts::find_conflict,
    pricing::{self, Quote},
    util::normalize_optional_text,
    validation::validate,
};

use super::{
    Engine,
    catalog::{active_service_catalog, require_active_staff, require_client},
    with_tx,
};

/// Every non-canceled appointment of `staff_id`, fresh from storage.
async fn active_agenda<C: ConnectionTrait>(db: &C, staff_id: Uuid) -> ResultEngine<Vec<Appointment>> {
    appointments::Entity::find()
        .filter(appointments::Column::StaffId.eq(staff_id.to_string()))
        .filter(appointments::Column::Status.ne(AppointmentStatus::Canceled.as_str()))
        .all(db)
        .await?
        .into_iter()
        .map(Appointment::try_from)
        .collect()
}

pub(super) async fn require_appointment<C: ConnectionTrait>(
    db: &C,
    appointment_id: Uuid,
) -> ResultEngine<Appointment> {
    appointments::Entity::find_by_id(appointment_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::ReferenceNotFound(format!("appointment {appointment_id}")))
        .and_then(Appointment::try_from)
}

/// Attempts at locking an appointment's staff before giving up under churn.
const STAFF_LOCK_ATTEMPTS: usize = 3;

impl Engine {
    /// Locks the staff member an appointment is stored under, plus `target`.
    ///
    /// The stored staff id is read again once the locks are held. If a
    /// concurrent edit moved the appointment in between, the guards are
    /// released and the read starts over.
    async fn lock_appointment_staff(
        &self,
        appointment_id: Uuid,
        target: Option<Uuid>,
    ) -> ResultEngine<Vec<OwnedMutexGuard<()>>> {
        for _ in 0..STAFF_LOCK_ATTEMPTS {
            let locked = require_appointment(&self.database, appointment_id)
                .await?
                .staff_id;
            let mut staff_ids = vec![locked];
            staff_ids.extend(target);
            let guards = self.staff_locks.acquire(staff_ids).await;

            let stored = require_appointment(&self.database, appointment_id)
                .await?
                .staff_id;
            if stored == locked || Some(stored) == target {
                return Ok(guards);
            }
            tracing::debug!(
                %appointment_id,
                %locked,
                %stored,
                "appointment moved to another staff member while locking"
            );
        }
        Err(EngineError::ConflictDetected(format!(
            "appointment {appointment_id} keeps moving between staff members; retry"
        )))
    }

    /// Runs the checks shared by creation and edits, in order: structural
    /// validation, references, conflict detection.
    ///
    /// `exclude` is the appointment being edited, so it never conflicts with
    /// itself.
    async fn check_slot<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate: &AppointmentCandidate,
        exclude: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        validate(candidate, now, &self.policy)?;

        require_client(db, candidate.client_id).await?;
        require_active_staff(db, candidate.staff_id).await?;

        let agenda = active_agenda(db, candidate.staff_id).await?;
        let slot = Slot {
            staff_id: candidate.staff_id,
            start_time: candidate.start_time,
            exclude,
        };
        if let Some(blocking) = find_conflict(&slot, &agenda, self.policy.guard_window) {
            tracing::warn!(
                staff_id = %candidate.staff_id,
                start = %candidate.start_time,
                blocking = %blocking.id,
                "booking rejected: slot taken"
            );
            return Err(EngineError::ConflictDetected(CONFLICT_REASON.to_string()));
        }
        Ok(())
    }

    /// Prices the candidate's services from the active catalog and checks the
    /// result against the caller-supplied total, if any.
    async fn price<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate: &AppointmentCandidate,
    ) -> ResultEngine<Quote> {
        let catalog = active_service_catalog(db, &candidate.service_ids).await?;
        let quote = pricing::quote(&candidate.service_ids, &catalog)?;
        if let Some(reason) = self.policy.total_violation(quote.total) {
            return Err(EngineError::ValidationFailed(vec![format!(
                "services {reason}"
            )]));
        }
        if let Some(supplied) = candidate.total_value
            && supplied != quote.total
        {
            return Err(EngineError::ValidationFailed(vec![format!(
                "total value {supplied} does not match services total {}",
                quote.total
            )]));
        }
        Ok(quote)
    }

    /// Validates, conflict-checks and prices a candidate, then persists it in
    /// `scheduled`.
    pub async fn propose_appointment(
        &self,
        candidate: AppointmentCandidate,
    ) -> ResultEngine<Appointment> {
        let _guards = self.staff_locks.acquire(vec![candidate.staff_id]).await;
        let now = Utc::now();

        let appointment = with_tx!(self, |db_tx| {
            let checked = match self.check_slot(&db_tx, &candidate, None, now).await {
                Ok(()) => self.price(&db_tx, &candidate).await,
                Err(err) => Err(err),
            };
            let quote = match checked {
                Ok(quote) => quote,
                Err(err) => {
                    tracing::warn!(staff_id = %candidate.staff_id, "booking rejected: {err}");
                    return Err(err);
                }
            };
            let appointment = Appointment {
                id: Uuid::new_v4(),
                client_id: candidate.client_id,
                staff_id: candidate.staff_id,
                service_ids: candidate.service_ids,
                start_time: candidate.start_time,
                status: AppointmentStatus::Scheduled,
                total_value: quote.total,
                duration_minutes: quote.duration_minutes,
                notes: normalize_optional_text(candidate.notes.as_deref()),
                payment_method: candidate.payment_method,
                created_at: now,
                updated_at: now,
            };
            appointments::ActiveModel::try_from(&appointment)?
                .insert(&db_tx)
                .await?;
            Ok::<_, EngineError>(appointment)
        })?;

        tracing::info!(
            appointment_id = %appointment.id,
            staff_id = %appointment.staff_id,
            start = %appointment.start_time,
            total = %appointment.total_value,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Replaces the editable fields of an appointment.
    ///
    /// The merged appointment goes through the same checks as a new booking,
    /// against every other appointment of its staff member. The captured total
    /// is re-priced only when the service list changes.
    pub async fn edit_appointment(
        &self,
        appointment_id: Uuid,
        edit: AppointmentEdit,
    ) -> ResultEngine<Appointment> {
        let _guards = self
            .lock_appointment_staff(appointment_id, edit.staff_id)
            .await?;
        let now = Utc::now();

        let updated = with_tx!(self, |db_tx| {
            // Re-read inside the transaction; a concurrent transition may have landed.
            let current = require_appointment(&db_tx, appointment_id).await?;
            if current.status.is_terminal() {
                return Err(EngineError::IllegalTransition(format!(
                    "appointment is {}; terminal appointments cannot be edited",
                    current.status
                )));
            }

            let services_changed = edit
                .service_ids
                .as_ref()
                .is_some_and(|ids| *ids != current.service_ids);
            let candidate = AppointmentCandidate {
                client_id: edit.client_id.unwrap_or(current.client_id),
                staff_id: edit.staff_id.unwrap_or(current.staff_id),
                service_ids: edit
                    .service_ids
                    .clone()
                    .unwrap_or_else(|| current.service_ids.clone()),
                start_time: edit.start_time.unwrap_or(current.start_time),
                total_value: edit.total_value,
                notes: edit.notes.clone().unwrap_or_else(|| current.notes.clone()),
                payment_method: edit.payment_method.unwrap_or(current.payment_method),
            };

            self.check_slot(&db_tx, &candidate, Some(appointment_id), now)
                .await?;
            let (total_value, duration_minutes) = if services_changed {
                let quote = self.price(&db_tx, &candidate).await?;
                (quote.total, quote.duration_minutes)
            } else {
                if let Some(supplied) = candidate.total_value
                    && supplied != current.total_value
                {
                    return Err(EngineError::ValidationFailed(vec![format!(
                        "total value {supplied} does not match captured total {}",
                        current.total_value
                    )]));
                }
                (current.total_value, current.duration_minutes)
            };

            let updated = Appointment {
                client_id: candidate.client_id,
                staff_id: candidate.staff_id,
                service_ids: candidate.service_ids,
                start_time: candidate.start_time,
                total_value,
                duration_minutes,
                notes: normalize_optional_text(candidate.notes.as_deref()),
                payment_method: candidate.payment_method,
                updated_at: now,
                ..current
            };
            let mut model = appointments::ActiveModel::try_from(&updated)?;
            model.created_at = ActiveValue::NotSet;
            model.update(&db_tx).await?;
            Ok::<_, EngineError>(updated)
        })?;

        tracing::info!(%appointment_id, "appointment edited");
        Ok(updated)
    }

    /// Moves an appointment through its lifecycle.
    ///
    /// Reaching `completed` does not touch the ledger; see
    /// [`Engine::reconcile_appointment`].
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
    ) -> ResultEngine<Appointment> {
        let now = Utc::now();
        let appointment = with_tx!(self, |db_tx| {
            let mut appointment = require_appointment(&db_tx, appointment_id).await?;
            let from = appointment.status;
            if let Err(err) = appointment.transition(target, now) {
                tracing::warn!(%appointment_id, %from, %target, "illegal transition");
                return Err(err);
            }
            appointments::ActiveModel {
                id: ActiveValue::Set(appointment_id.to_string()),
                status: ActiveValue::Set(appointment.status.as_str().to_string()),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(%appointment_id, %from, to = %target, "appointment transitioned");
            Ok::<_, EngineError>(appointment)
        })?;
        Ok(appointment)
    }

    /// Administrative hard delete, outside the lifecycle. Ledger entries that
    /// referenced the appointment are kept.
    pub async fn delete_appointment(&self, appointment_id: Uuid) -> ResultEngine<()> {
        let result = appointments::Entity::delete_by_id(appointment_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::ReferenceNotFound(format!(
                "appointment {appointment_id}"
            )));
        }
        tracing::info!(%appointment_id, "appointment deleted");
        Ok(())
    }

    pub async fn appointment(&self, appointment_id: Uuid) -> ResultEngine<Appointment> {
        require_appointment(&self.database, appointment_id).await
    }

    /// Lists appointments matching `filter`, earliest start first.
    pub async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> ResultEngine<Vec<Appointment>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from >= to
        {
            return Err(EngineError::OutOfRange(
                "invalid range: from must be < to".to_string(),
            ));
        }

        let mut condition = Condition::all();
        if let Some(staff_id) = filter.staff_id {
            condition = condition.add(appointments::Column::StaffId.eq(staff_id.to_string()));
        }
        if let Some(client_id) = filter.client_id {
            condition = condition.add(appointments::Column::ClientId.eq(client_id.to_string()));
        }
        if let Some(statuses) = &filter.statuses {
            let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
            condition = condition.add(appointments::Column::Status.is_in(statuses));
        }
        if let Some(from) = filter.from {
            condition = condition.add(appointments::Column::StartTime.gte(from));
        }
        if let Some(to) = filter.to {
            condition = condition.add(appointments::Column::StartTime.lt(to));
        }

        appointments::Entity::find()
            .filter(condition)
            .order_by_asc(appointments::Column::StartTime)
            .order_by_asc(appointments::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Appointment::try_from)
            .collect()
    }
}
