use chrono::NaiveDate;
use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Appointment, AppointmentStatus, CommissionLine, DateRange, EngineError, FinancialSummary,
    LedgerEntry, LedgerEntryCmd, LedgerKind, ResultEngine, appointments, ledger, reports,
    util::{normalize_category_key, normalize_optional_text},
};

use super::{Engine, appointments::require_appointment};

/// Category used by [`Engine::reconcile_appointment`].
pub const RECONCILE_CATEGORY: &str = "service";

impl Engine {
    /// Appends an entry to the ledger.
    ///
    /// The amount and date window are checked against today's date in the
    /// business timezone. A linked appointment must exist; nothing stops
    /// several entries from linking the same appointment.
    pub async fn record_ledger_entry(&self, cmd: LedgerEntryCmd) -> ResultEngine<LedgerEntry> {
        let category = normalize_category_key(&cmd.category)?;
        if let Some(appointment_id) = cmd.linked_appointment_id {
            require_appointment(&self.database, appointment_id).await?;
        }
        let entry = LedgerEntry::new(
            cmd.kind,
            category,
            normalize_optional_text(Some(&cmd.description)).unwrap_or_default(),
            cmd.amount,
            cmd.date,
            cmd.linked_appointment_id,
            self.today(),
        )?;
        ledger::ActiveModel::from(&entry)
            .insert(&self.database)
            .await?;
        tracing::info!(
            entry_id = %entry.id,
            kind = entry.kind.as_str(),
            category = %entry.category,
            amount = %entry.amount,
            "ledger entry recorded"
        );
        Ok(entry)
    }

    /// Records the revenue of a completed appointment.
    ///
    /// Reconciliation is always caller initiated; completing an appointment
    /// never writes to the ledger by itself.
    pub async fn reconcile_appointment(
        &self,
        appointment_id: Uuid,
        date: Option<NaiveDate>,
    ) -> ResultEngine<LedgerEntry> {
        let appointment = require_appointment(&self.database, appointment_id).await?;
        if appointment.status != AppointmentStatus::Completed {
            return Err(EngineError::IllegalTransition(format!(
                "appointment is {}; only completed appointments are reconciled",
                appointment.status
            )));
        }
        let date = date.unwrap_or_else(|| self.today());
        let cmd = LedgerEntryCmd::new(
            LedgerKind::Revenue,
            RECONCILE_CATEGORY,
            appointment.total_value,
            date,
        )
        .description(format!("appointment {appointment_id}"))
        .linked_appointment(appointment_id);
        self.record_ledger_entry(cmd).await
    }

    /// Entries dated inside `range`, oldest first.
    pub async fn ledger_entries(&self, range: &DateRange) -> ResultEngine<Vec<LedgerEntry>> {
        ledger::Entity::find()
            .filter(ledger::Column::Date.gte(range.start))
            .filter(ledger::Column::Date.lte(range.end))
            .order_by_asc(ledger::Column::Date)
            .order_by_asc(ledger::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    /// Entries linked to an appointment.
    pub async fn ledger_entries_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        ledger::Entity::find()
            .filter(ledger::Column::LinkedAppointmentId.eq(appointment_id.to_string()))
            .order_by_asc(ledger::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    /// Totals and category breakdown for `range`; month to date when `None`.
    pub async fn financial_summary(&self, range: Option<DateRange>) -> ResultEngine<FinancialSummary> {
        let range = range.unwrap_or_else(|| DateRange::month_to_date(self.today()));
        let entries = self.ledger_entries(&range).await?;
        tracing::debug!(
            start = %range.start,
            end = %range.end,
            entries = entries.len(),
            "financial summary"
        );
        Ok(reports::summarize(&entries, &range))
    }

    /// Commission owed per staff member for completed work in `range`
    /// (month to date when `None`).
    pub async fn commission_report(&self, range: Option<DateRange>) -> ResultEngine<Vec<CommissionLine>> {
        let range = range.unwrap_or_else(|| DateRange::month_to_date(self.today()));
        // Widen by a day on each side: the range is in local dates, storage is UTC.
        let from = range
            .start
            .pred_opt()
            .unwrap_or(range.start)
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc());
        let to = range
            .end
            .succ_opt()
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());

        let mut query = appointments::Entity::find()
            .filter(appointments::Column::Status.eq(AppointmentStatus::Completed.as_str()));
        if let Some(from) = from {
            query = query.filter(appointments::Column::StartTime.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(appointments::Column::StartTime.lt(to));
        }
        let completed = query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Appointment::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let staff = super::catalog::staff_by_id(&self.database).await?;
        Ok(reports::commissions(
            &completed,
            &staff,
            &range,
            self.policy.timezone,
        ))
    }
}
