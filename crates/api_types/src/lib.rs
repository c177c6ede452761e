use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// Every failed rule, for validation errors; a single entry otherwise.
    pub reasons: Vec<String>,
}

pub mod catalog {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientNew {
        pub name: String,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub cpf: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientView {
        pub id: Uuid,
        pub name: String,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub cpf: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StaffNew {
        pub name: String,
        /// Basis points: `1_000` is 10%.
        #[serde(default)]
        pub commission_bps: u32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StaffView {
        pub id: Uuid,
        pub name: String,
        pub commission_bps: u32,
        pub active: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StaffActive {
        pub active: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CatalogList {
        pub include_inactive: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceNew {
        pub name: String,
        pub price_minor: i64,
        pub duration_minutes: u32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceUpdate {
        pub price_minor: Option<i64>,
        pub active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceView {
        pub id: Uuid,
        pub name: String,
        pub price_minor: i64,
        pub duration_minutes: u32,
        pub active: bool,
    }
}

pub mod appointment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AppointmentStatus {
        Scheduled,
        Confirmed,
        InProgress,
        Completed,
        Canceled,
        NoShow,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMethod {
        Cash,
        CreditCard,
        DebitCard,
        Pix,
        Other,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AppointmentNew {
        pub client_id: Uuid,
        pub staff_id: Uuid,
        /// Repeats are allowed and charged once per occurrence.
        pub service_ids: Vec<Uuid>,
        /// RFC3339 timestamp, including timezone offset.
        pub start_time: DateTime<FixedOffset>,
        /// Optional cross-check; must equal the catalog total when present.
        pub total_minor: Option<i64>,
        pub notes: Option<String>,
        pub payment_method: Option<PaymentMethod>,
    }

    /// Partial update. Absent fields keep their value; `null` clears the
    /// nullable ones.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AppointmentUpdate {
        pub client_id: Option<Uuid>,
        pub staff_id: Option<Uuid>,
        pub service_ids: Option<Vec<Uuid>>,
        pub start_time: Option<DateTime<FixedOffset>>,
        pub total_minor: Option<i64>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub notes: Option<Option<String>>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub payment_method: Option<Option<PaymentMethod>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AppointmentTransition {
        pub status: AppointmentStatus,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AppointmentList {
        pub staff_id: Option<Uuid>,
        pub client_id: Option<Uuid>,
        /// Comma separated statuses, e.g. `scheduled,confirmed`.
        pub status: Option<String>,
        /// Inclusive lower bound (RFC3339).
        pub from: Option<DateTime<FixedOffset>>,
        /// Exclusive upper bound (RFC3339).
        pub to: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AppointmentView {
        pub id: Uuid,
        pub client_id: Uuid,
        pub staff_id: Uuid,
        pub service_ids: Vec<Uuid>,
        pub start_time: DateTime<FixedOffset>,
        pub end_time: DateTime<FixedOffset>,
        pub status: AppointmentStatus,
        pub total_minor: i64,
        pub duration_minutes: u32,
        pub notes: Option<String>,
        pub payment_method: Option<PaymentMethod>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AppointmentListResponse {
        pub appointments: Vec<AppointmentView>,
    }
}

pub mod ledger {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LedgerKind {
        Revenue,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerEntryNew {
        pub kind: LedgerKind,
        pub category: String,
        #[serde(default)]
        pub description: String,
        pub amount_minor: i64,
        /// Defaults to today in the business timezone.
        pub date: Option<NaiveDate>,
        pub linked_appointment_id: Option<Uuid>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Reconcile {
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerEntryView {
        pub id: Uuid,
        pub kind: LedgerKind,
        pub category: String,
        pub description: String,
        pub amount_minor: i64,
        pub date: NaiveDate,
        pub linked_appointment_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerListResponse {
        pub entries: Vec<LedgerEntryView>,
    }
}

pub mod report {
    use super::*;

    /// Inclusive `YYYY-MM-DD` bounds, kept raw so that a malformed value falls
    /// back to month to date instead of failing the request.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReportRange {
        pub start: Option<String>,
        pub end: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTotal {
        pub category: String,
        pub total_minor: i64,
        pub entries: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FinancialSummary {
        pub start: NaiveDate,
        pub end: NaiveDate,
        pub total_revenue_minor: i64,
        pub total_expense_minor: i64,
        pub balance_minor: i64,
        pub revenue_by_category: Vec<CategoryTotal>,
        pub expense_by_category: Vec<CategoryTotal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CommissionLine {
        pub staff_id: Uuid,
        pub staff_name: String,
        pub completed: usize,
        pub revenue_minor: i64,
        pub commission_bps: u32,
        pub commission_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CommissionReport {
        pub start: NaiveDate,
        pub end: NaiveDate,
        pub lines: Vec<CommissionLine>,
    }
}
