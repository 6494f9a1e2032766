//! # Read API
//!
//! HTTP surface for rendering collaborators. Handlers read the latest
//! [`FleetView`] published by the session and never touch session state
//! directly; the operator's clear action is forwarded as a command.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use fleet_state::{
    ALERT_CAPACITY, Alert, Connectivity, Controller, FleetMetrics, FleetView, LivenessFilter,
    Principal, Provider, PushTransport, RouteSummary, Session, Stop, Vehicle,
};
use http::StatusCode;
use realtime::{HttpResult, bad_request, not_found, unavailable};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    view: watch::Receiver<FleetView>,
    controller: Controller,
    principal: Principal,
    liveness: LivenessFilter,
}

impl AppState {
    #[must_use]
    pub const fn new(
        view: watch::Receiver<FleetView>, controller: Controller, principal: Principal,
        liveness: LivenessFilter,
    ) -> Self {
        Self { view, controller, principal, liveness }
    }

    /// Read handle on a running session.
    #[must_use]
    pub fn for_session<T: PushTransport, P: Provider>(session: &Session<T, P>) -> Self {
        Self::new(
            session.watch(),
            session.controller(),
            session.principal().clone(),
            *session.liveness(),
        )
    }

    fn current(&self) -> FleetView {
        self.view.borrow().clone()
    }
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/fleet", get(fleet))
        .route("/fleet/live", get(live_fleet))
        .route("/fleet/{vehicle_id}", get(vehicle))
        .route("/alerts", get(alerts).delete(clear_alerts))
        .route("/metrics", get(metrics))
        .route("/routes", get(routes))
        .route("/status", get(status))
        .route("/view", get(view))
        .with_state(state)
}

async fn fleet(State(state): State<AppState>) -> Json<Vec<Vehicle>> {
    Json(state.current().vehicles)
}

async fn live_fleet(State(state): State<AppState>) -> Json<Vec<Vehicle>> {
    let vehicles = state.current().vehicles;
    Json(state.liveness.live(&vehicles, Utc::now()))
}

async fn vehicle(
    State(state): State<AppState>, Path(vehicle_id): Path<String>,
) -> HttpResult<Json<Vehicle>> {
    let vehicle = state.current().vehicles.into_iter().find(|v| v.vehicle_id == vehicle_id);
    vehicle.map(Json).ok_or_else(|| not_found!("vehicle {vehicle_id}").into())
}

#[derive(Debug, Deserialize)]
struct AlertQuery {
    limit: Option<usize>,
}

async fn alerts(
    State(state): State<AppState>, query: Result<Query<AlertQuery>, QueryRejection>,
) -> HttpResult<Json<Vec<Alert>>> {
    let Query(query) = query.map_err(|e| bad_request!("{}", e.body_text()))?;
    let limit = query.limit.unwrap_or(ALERT_CAPACITY);
    if limit == 0 {
        return Err(bad_request!("limit must be positive").into());
    }
    Ok(Json(state.current().alerts.into_iter().take(limit).collect()))
}

async fn clear_alerts(State(state): State<AppState>) -> HttpResult<StatusCode> {
    state.controller.clear_alerts().await.map_err(|e| unavailable!("{e}"))?;
    tracing::info!(principal = %state.principal.id, "alert clear requested");
    Ok(StatusCode::ACCEPTED)
}

async fn metrics(State(state): State<AppState>) -> Json<FleetMetrics> {
    Json(state.current().metrics)
}

#[derive(Debug, Serialize)]
struct RoutesReply {
    routes: Vec<RouteSummary>,
    stops: Vec<Stop>,
    path: Vec<[f64; 2]>,
}

async fn routes(State(state): State<AppState>) -> Json<RoutesReply> {
    let view = state.current();
    Json(RoutesReply { routes: view.routes, stops: view.stops, path: view.path })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReply {
    connectivity: Connectivity,
    principal: Principal,
}

async fn status(State(state): State<AppState>) -> Json<StatusReply> {
    let connectivity = state.current().connectivity;
    Json(StatusReply { connectivity, principal: state.principal })
}

async fn view(State(state): State<AppState>) -> Json<FleetView> {
    Json(state.current())
}
