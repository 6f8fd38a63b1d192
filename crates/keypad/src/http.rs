//! Keypad Controller inbound HTTP surface (§4.7.2).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use shedcommon::auth::{auth_layer, HasAuthKey};
use shedcommon::logstore::LogStore;
use shedcommon::wire::{
    parse_json_body, HealthResponse, KeypadLockRequest, RequestLogsResponse, RetrieveConsoleLogsRequest,
};

use crate::agent::KeypadAgent;
use crate::error::KeypadError;

pub struct AppState {
    pub agent: Arc<KeypadAgent>,
    pub logs: Arc<LogStore>,
    pub authorisation_key: String,
}

impl HasAuthKey for AppState {
    fn auth_key(&self) -> &str {
        &self.authorisation_key
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/receiveCentralControllerPing", post(receive_central_controller_ping))
        .route("/receiveKeypadLock", post(receive_keypad_lock))
        .route("/retrieveConsoleLogs", post(retrieve_console_logs))
        .route("/_healthStatus", get(health_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer::<AppState>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn receive_central_controller_ping(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.agent.receive_central_controller_ping().await;
    "Ok".into_response()
}

async fn receive_keypad_lock(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let req: KeypadLockRequest = match parse_json_body(&headers, &body) {
        Ok(req) => req,
        Err(reason) => return KeypadError::BadRequest(reason).into_response(),
    };
    if req.lock_time < 0 {
        return KeypadError::BadRequest("lockTime must be >= 0").into_response();
    }
    state.agent.receive_keypad_lock(req.lock_time).await;
    "Ok".into_response()
}

async fn retrieve_console_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let req: RetrieveConsoleLogsRequest = match parse_json_body(&headers, &body) {
        Ok(req) => req,
        Err(reason) => return KeypadError::BadRequest(reason).into_response(),
    };
    if req.start_timestamp < 0.0 {
        return KeypadError::BadRequest("startTimestamp must be >= 0").into_response();
    }
    let entries = state.logs.since(req.start_timestamp);
    axum::Json(RequestLogsResponse::from_entries(entries, req.start_timestamp)).into_response()
}

async fn health_status() -> impl IntoResponse {
    axum::Json(HealthResponse::default())
}
