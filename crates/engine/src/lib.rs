//! Appointment scheduling and financial reconciliation engine.
//!
//! The pure core lives in [`validation`], [`conflicts`], [`lifecycle`],
//! [`pricing`] and [`reports`]. [`Engine`] runs it against the database:
//! it loads the data each rule needs, holds a per-staff lock across
//! load → validate → detect → persist, and writes inside a DB transaction.

pub use appointments::{Appointment, PaymentMethod};
pub use clients::Client;
pub use commands::{AppointmentCandidate, AppointmentEdit, AppointmentFilter, LedgerEntryCmd};
pub use conflicts::{CONFLICT_REASON, Slot, find_conflict, has_conflict};
pub use error::EngineError;
pub use ledger::{LedgerEntry, LedgerKind};
pub use lifecycle::AppointmentStatus;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use pricing::{Quote, compute_total, total_duration};
pub use reports::{CategoryTotal, CommissionLine, DateRange, FinancialSummary, summarize};
pub use services::Service;
pub use staff::Staff;
pub use validation::{BookingPolicy, validate};

mod appointments;
mod clients;
mod commands;
pub mod conflicts;
mod error;
mod ledger;
pub mod lifecycle;
mod money;
mod ops;
pub mod pricing;
pub mod reports;
mod services;
mod staff;
mod util;
pub mod validation;

type ResultEngine<T> = Result<T, EngineError>;
