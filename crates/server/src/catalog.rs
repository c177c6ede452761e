//! Clients, staff and services endpoints

use api_types::catalog::{
    CatalogList, ClientNew, ClientView, ServiceNew, ServiceUpdate, ServiceView, StaffActive,
    StaffNew, StaffView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::Money;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn client_view(client: engine::Client) -> ClientView {
    ClientView {
        id: client.id,
        name: client.name,
        phone: client.phone,
        email: client.email,
        cpf: client.cpf,
    }
}

fn staff_view(member: engine::Staff) -> StaffView {
    StaffView {
        id: member.id,
        name: member.name,
        commission_bps: member.commission_bps,
        active: member.active,
    }
}

fn service_view(service: engine::Service) -> ServiceView {
    ServiceView {
        id: service.id,
        name: service.name,
        price_minor: service.price.cents(),
        duration_minutes: service.duration_minutes,
        active: service.active,
    }
}

pub async fn client_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ClientNew>,
) -> Result<(StatusCode, Json<ClientView>), ServerError> {
    let client = state
        .engine
        .new_client(
            &payload.name,
            payload.phone.as_deref(),
            payload.email.as_deref(),
            payload.cpf.as_deref(),
        )
        .await?;
    tracing::debug!(user = %user.username, client_id = %client.id, "client registered");
    Ok((StatusCode::CREATED, Json(client_view(client))))
}

pub async fn client_list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<ClientView>>, ServerError> {
    let clients = state.engine.clients().await?;
    Ok(Json(clients.into_iter().map(client_view).collect()))
}

pub async fn client_get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientView>, ServerError> {
    Ok(Json(client_view(state.engine.client(id).await?)))
}

pub async fn staff_new(
    State(state): State<ServerState>,
    Json(payload): Json<StaffNew>,
) -> Result<(StatusCode, Json<StaffView>), ServerError> {
    let member = state
        .engine
        .new_staff(&payload.name, payload.commission_bps)
        .await?;
    Ok((StatusCode::CREATED, Json(staff_view(member))))
}

pub async fn staff_list(
    State(state): State<ServerState>,
    Query(params): Query<CatalogList>,
) -> Result<Json<Vec<StaffView>>, ServerError> {
    let staff = state
        .engine
        .staff(params.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(staff.into_iter().map(staff_view).collect()))
}

pub async fn staff_set_active(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StaffActive>,
) -> Result<Json<StaffView>, ServerError> {
    let member = state.engine.set_staff_active(id, payload.active).await?;
    Ok(Json(staff_view(member)))
}

pub async fn service_new(
    State(state): State<ServerState>,
    Json(payload): Json<ServiceNew>,
) -> Result<(StatusCode, Json<ServiceView>), ServerError> {
    let service = state
        .engine
        .new_service(
            &payload.name,
            Money::new(payload.price_minor),
            payload.duration_minutes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(service_view(service))))
}

pub async fn service_list(
    State(state): State<ServerState>,
    Query(params): Query<CatalogList>,
) -> Result<Json<Vec<ServiceView>>, ServerError> {
    let services = state
        .engine
        .services(params.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(services.into_iter().map(service_view).collect()))
}

pub async fn service_update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ServiceUpdate>,
) -> Result<Json<ServiceView>, ServerError> {
    if payload.price_minor.is_none() && payload.active.is_none() {
        return Err(ServerError::Generic(
            "price_minor or active required".to_string(),
        ));
    }
    let mut service = state.engine.service(id).await?;
    if let Some(price_minor) = payload.price_minor {
        service = state
            .engine
            .update_service_price(id, Money::new(price_minor))
            .await?;
    }
    if let Some(active) = payload.active {
        service = state.engine.set_service_active(id, active).await?;
    }
    Ok(Json(service_view(service)))
}
