//! Appointment endpoints: booking, edits, lifecycle and queries

use api_types::appointment::{
    AppointmentList, AppointmentListResponse, AppointmentNew, AppointmentStatus as ApiStatus,
    AppointmentTransition, AppointmentUpdate, AppointmentView, PaymentMethod as ApiPayment,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    AppointmentCandidate, AppointmentEdit, AppointmentFilter, AppointmentStatus, Money,
    PaymentMethod,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_status(status: AppointmentStatus) -> ApiStatus {
    match status {
        AppointmentStatus::Scheduled => ApiStatus::Scheduled,
        AppointmentStatus::Confirmed => ApiStatus::Confirmed,
        AppointmentStatus::InProgress => ApiStatus::InProgress,
        AppointmentStatus::Completed => ApiStatus::Completed,
        AppointmentStatus::Canceled => ApiStatus::Canceled,
        AppointmentStatus::NoShow => ApiStatus::NoShow,
    }
}

fn engine_status(status: ApiStatus) -> AppointmentStatus {
    match status {
        ApiStatus::Scheduled => AppointmentStatus::Scheduled,
        ApiStatus::Confirmed => AppointmentStatus::Confirmed,
        ApiStatus::InProgress => AppointmentStatus::InProgress,
        ApiStatus::Completed => AppointmentStatus::Completed,
        ApiStatus::Canceled => AppointmentStatus::Canceled,
        ApiStatus::NoShow => AppointmentStatus::NoShow,
    }
}

fn map_payment(method: PaymentMethod) -> ApiPayment {
    match method {
        PaymentMethod::Cash => ApiPayment::Cash,
        PaymentMethod::CreditCard => ApiPayment::CreditCard,
        PaymentMethod::DebitCard => ApiPayment::DebitCard,
        PaymentMethod::Pix => ApiPayment::Pix,
        PaymentMethod::Other => ApiPayment::Other,
    }
}

fn engine_payment(method: ApiPayment) -> PaymentMethod {
    match method {
        ApiPayment::Cash => PaymentMethod::Cash,
        ApiPayment::CreditCard => PaymentMethod::CreditCard,
        ApiPayment::DebitCard => PaymentMethod::DebitCard,
        ApiPayment::Pix => PaymentMethod::Pix,
        ApiPayment::Other => PaymentMethod::Other,
    }
}

/// Renders an appointment with its times in the business timezone.
fn view(state: &ServerState, appointment: engine::Appointment) -> AppointmentView {
    let tz = state.engine.policy().timezone;
    AppointmentView {
        id: appointment.id,
        client_id: appointment.client_id,
        staff_id: appointment.staff_id,
        start_time: appointment.start_time.with_timezone(&tz).fixed_offset(),
        end_time: appointment.end_time().with_timezone(&tz).fixed_offset(),
        service_ids: appointment.service_ids,
        status: map_status(appointment.status),
        total_minor: appointment.total_value.cents(),
        duration_minutes: appointment.duration_minutes,
        notes: appointment.notes,
        payment_method: appointment.payment_method.map(map_payment),
    }
}

/// Parses `scheduled,confirmed` into engine statuses.
fn parse_statuses(raw: &str) -> Result<Vec<AppointmentStatus>, ServerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            AppointmentStatus::try_from(s)
                .map_err(|_| ServerError::Generic(format!("unknown status: {s}")))
        })
        .collect()
}

pub async fn propose(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AppointmentNew>,
) -> Result<(StatusCode, Json<AppointmentView>), ServerError> {
    let mut candidate = AppointmentCandidate::new(
        payload.client_id,
        payload.staff_id,
        payload.service_ids,
        payload.start_time.with_timezone(&Utc),
    );
    if let Some(total_minor) = payload.total_minor {
        candidate = candidate.total_value(Money::new(total_minor));
    }
    if let Some(notes) = payload.notes {
        candidate = candidate.notes(notes);
    }
    if let Some(method) = payload.payment_method {
        candidate = candidate.payment_method(engine_payment(method));
    }

    let appointment = state.engine.propose_appointment(candidate).await?;
    tracing::debug!(user = %user.username, appointment_id = %appointment.id, "booked via api");
    Ok((StatusCode::CREATED, Json(view(&state, appointment))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentView>, ServerError> {
    let appointment = state.engine.appointment(id).await?;
    Ok(Json(view(&state, appointment)))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<AppointmentList>,
) -> Result<Json<AppointmentListResponse>, ServerError> {
    let statuses = params.status.as_deref().map(parse_statuses).transpose()?;
    let filter = AppointmentFilter {
        staff_id: params.staff_id,
        client_id: params.client_id,
        statuses,
        from: params.from.map(|dt| dt.with_timezone(&Utc)),
        to: params.to.map(|dt| dt.with_timezone(&Utc)),
    };

    let appointments = state.engine.list_appointments(&filter).await?;
    Ok(Json(AppointmentListResponse {
        appointments: appointments
            .into_iter()
            .map(|appointment| view(&state, appointment))
            .collect(),
    }))
}

pub async fn edit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AppointmentUpdate>,
) -> Result<Json<AppointmentView>, ServerError> {
    let edit = AppointmentEdit {
        client_id: payload.client_id,
        staff_id: payload.staff_id,
        service_ids: payload.service_ids,
        start_time: payload.start_time.map(|dt| dt.with_timezone(&Utc)),
        total_value: payload.total_minor.map(Money::new),
        notes: payload.notes,
        payment_method: payload.payment_method.map(|m| m.map(engine_payment)),
    };

    let appointment = state.engine.edit_appointment(id, edit).await?;
    tracing::debug!(user = %user.username, appointment_id = %id, "edited via api");
    Ok(Json(view(&state, appointment)))
}

pub async fn transition(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AppointmentTransition>,
) -> Result<Json<AppointmentView>, ServerError> {
    let appointment = state
        .engine
        .transition(id, engine_status(payload.status))
        .await?;
    tracing::debug!(user = %user.username, appointment_id = %id, "status changed via api");
    Ok(Json(view(&state, appointment)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_list_parses_and_rejects_unknown() {
        assert_eq!(
            parse_statuses("scheduled, no_show,").ok(),
            Some(vec![AppointmentStatus::Scheduled, AppointmentStatus::NoShow])
        );
        assert!(parse_statuses("scheduled,late").is_err());
    }

    #[test]
    fn status_mapping_is_lossless() {
        for status in AppointmentStatus::ALL {
            assert_eq!(engine_status(map_status(status)), status);
        }
    }
}
