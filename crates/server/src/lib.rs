use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod appointments;
mod catalog;
mod ledger;
mod reports;
mod server;
mod user;

pub mod types {
    pub mod catalog {
        pub use api_types::catalog::{
            CatalogList, ClientNew, ClientView, ServiceNew, ServiceUpdate, ServiceView, StaffActive,
            StaffNew, StaffView,
        };
    }

    pub mod appointment {
        pub use api_types::appointment::{
            AppointmentList, AppointmentListResponse, AppointmentNew, AppointmentStatus,
            AppointmentTransition, AppointmentUpdate, AppointmentView, PaymentMethod,
        };
    }

    pub mod ledger {
        pub use api_types::ledger::{
            LedgerEntryNew, LedgerEntryView, LedgerKind, LedgerListResponse, Reconcile,
        };
    }

    pub mod report {
        pub use api_types::report::{
            CategoryTotal, CommissionLine, CommissionReport, FinancialSummary, ReportRange,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::ReferenceNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ConflictDetected(_) | EngineError::IllegalTransition(_) => {
            StatusCode::CONFLICT
        }
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::ValidationFailed(_)
        | EngineError::OutOfRange(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn body_for_engine_error(err: EngineError) -> ErrorBody {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorBody {
                error: "internal server error".to_string(),
                reasons: vec!["internal server error".to_string()],
            }
        }
        other => ErrorBody {
            error: other.to_string(),
            reasons: other.reasons(),
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Generic(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    reasons: vec![err.clone()],
                    error: err,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
