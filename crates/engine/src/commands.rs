//! Command structs for engine operations.
//!
//! These types group parameters for write operations (booking, editing,
//! ledger entries), keeping call sites readable and avoiding long argument
//! lists.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{AppointmentStatus, LedgerKind, Money, PaymentMethod};

/// A proposed appointment, before validation and conflict detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentCandidate {
    pub client_id: Uuid,
    pub staff_id: Uuid,
    pub service_ids: Vec<Uuid>,
    pub start_time: DateTime<Utc>,
    /// Caller-supplied total; when present it must match the catalog total.
    pub total_value: Option<Money>,
    pub notes: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

impl AppointmentCandidate {
    #[must_use]
    pub fn new(
        client_id: Uuid,
        staff_id: Uuid,
        service_ids: Vec<Uuid>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            client_id,
            staff_id,
            service_ids,
            start_time,
            total_value: None,
            notes: None,
            payment_method: None,
        }
    }

    #[must_use]
    pub fn total_value(mut self, total: Money) -> Self {
        self.total_value = Some(total);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }
}

/// Field changes for an existing appointment. `None` keeps the current value.
///
/// Status is not editable here; use `Engine::transition`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppointmentEdit {
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub service_ids: Option<Vec<Uuid>>,
    pub start_time: Option<DateTime<Utc>>,
    pub total_value: Option<Money>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
    /// `Some(None)` clears the payment method.
    pub payment_method: Option<Option<PaymentMethod>>,
}

impl AppointmentEdit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn client_id(mut self, client_id: Uuid) -> Self {
        self.client_id = Some(client_id);
        self
    }

    #[must_use]
    pub fn staff_id(mut self, staff_id: Uuid) -> Self {
        self.staff_id = Some(staff_id);
        self
    }

    #[must_use]
    pub fn service_ids(mut self, service_ids: Vec<Uuid>) -> Self {
        self.service_ids = Some(service_ids);
        self
    }

    #[must_use]
    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    #[must_use]
    pub fn total_value(mut self, total: Money) -> Self {
        self.total_value = Some(total);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, method: Option<PaymentMethod>) -> Self {
        self.payment_method = Some(method);
        self
    }
}

/// Filters for listing appointments.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct AppointmentFilter {
    pub staff_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    /// If present, acts as an allow-list of statuses to return.
    pub statuses: Option<Vec<AppointmentStatus>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Create a ledger entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntryCmd {
    pub kind: LedgerKind,
    pub category: String,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub linked_appointment_id: Option<Uuid>,
}

impl LedgerEntryCmd {
    #[must_use]
    pub fn new(
        kind: LedgerKind,
        category: impl Into<String>,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            category: category.into(),
            description: String::new(),
            amount,
            date,
            linked_appointment_id: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn linked_appointment(mut self, appointment_id: Uuid) -> Self {
        self.linked_appointment_id = Some(appointment_id);
        self
    }
}
