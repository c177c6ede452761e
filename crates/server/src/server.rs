use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{appointments, catalog, ledger, reports, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        tracing::debug!(username = auth_header.username(), "rejected credentials");
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Every route, behind Basic authentication.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/clients", post(catalog::client_new).get(catalog::client_list))
        .route("/clients/{id}", get(catalog::client_get))
        .route("/staff", post(catalog::staff_new).get(catalog::staff_list))
        .route("/staff/{id}", axum::routing::patch(catalog::staff_set_active))
        .route(
            "/services",
            post(catalog::service_new).get(catalog::service_list),
        )
        .route(
            "/services/{id}",
            axum::routing::patch(catalog::service_update),
        )
        .route(
            "/appointments",
            post(appointments::propose).get(appointments::list),
        )
        .route(
            "/appointments/{id}",
            get(appointments::get).patch(appointments::edit),
        )
        .route("/appointments/{id}/status", post(appointments::transition))
        .route(
            "/appointments/{id}/reconcile",
            post(ledger::reconcile_appointment),
        )
        .route(
            "/appointments/{id}/ledger",
            get(ledger::entries_for_appointment),
        )
        .route("/ledger", post(ledger::entry_new).get(ledger::list))
        .route("/reports/summary", get(reports::summary))
        .route("/reports/commissions", get(reports::commissions))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection, addr: String) {
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
