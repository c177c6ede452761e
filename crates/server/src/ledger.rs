//! Ledger endpoints

use api_types::{
    ledger::{
        LedgerEntryNew, LedgerEntryView, LedgerKind as ApiKind, LedgerListResponse, Reconcile,
    },
    report::ReportRange,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{EngineError, LedgerEntryCmd, LedgerKind, Money};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_kind(kind: LedgerKind) -> ApiKind {
    match kind {
        LedgerKind::Revenue => ApiKind::Revenue,
        LedgerKind::Expense => ApiKind::Expense,
    }
}

fn engine_kind(kind: ApiKind) -> LedgerKind {
    match kind {
        ApiKind::Revenue => LedgerKind::Revenue,
        ApiKind::Expense => LedgerKind::Expense,
    }
}

fn view(entry: engine::LedgerEntry) -> LedgerEntryView {
    LedgerEntryView {
        id: entry.id,
        kind: map_kind(entry.kind),
        category: entry.category,
        description: entry.description,
        amount_minor: entry.amount.cents(),
        date: entry.date,
        linked_appointment_id: entry.linked_appointment_id,
    }
}

pub async fn entry_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<LedgerEntryNew>,
) -> Result<(StatusCode, Json<LedgerEntryView>), ServerError> {
    let kind = engine_kind(payload.kind);
    if !kind.allows_category(&payload.category) {
        return Err(EngineError::OutOfRange(format!(
            "unknown {} category: {} (expected one of: {})",
            kind.as_str(),
            payload.category,
            kind.categories().join(", ")
        ))
        .into());
    }

    let date = payload.date.unwrap_or_else(|| state.engine.today());
    let mut cmd = LedgerEntryCmd::new(
        kind,
        payload.category,
        Money::new(payload.amount_minor),
        date,
    )
    .description(payload.description);
    if let Some(appointment_id) = payload.linked_appointment_id {
        cmd = cmd.linked_appointment(appointment_id);
    }

    let entry = state.engine.record_ledger_entry(cmd).await?;
    tracing::debug!(user = %user.username, entry_id = %entry.id, "ledger entry via api");
    Ok((StatusCode::CREATED, Json(view(entry))))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ReportRange>,
) -> Result<Json<LedgerListResponse>, ServerError> {
    let range = crate::reports::resolve_range(&params, state.engine.today());
    let entries = state.engine.ledger_entries(&range).await?;
    Ok(Json(LedgerListResponse {
        entries: entries.into_iter().map(view).collect(),
    }))
}

pub async fn entries_for_appointment(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LedgerListResponse>, ServerError> {
    let entries = state.engine.ledger_entries_for_appointment(id).await?;
    Ok(Json(LedgerListResponse {
        entries: entries.into_iter().map(view).collect(),
    }))
}

pub async fn reconcile_appointment(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<Reconcile>>,
) -> Result<(StatusCode, Json<LedgerEntryView>), ServerError> {
    let date = payload.and_then(|Json(body)| body.date);
    let entry = state.engine.reconcile_appointment(id, date).await?;
    tracing::debug!(user = %user.username, appointment_id = %id, "reconciled via api");
    Ok((StatusCode::CREATED, Json(view(entry))))
}
