//! Central Controller HTTP surface (§4.6).

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
use shedcommon::event::EventBus;
use shedcommon::logstore::LogStore;
use shedcommon::wire::{
    parse_json_body, HealthResponse, ReceiveKeyCodeRequest, RequestLogsResponse, RetrieveConsoleLogsRequest,
};

use crate::error::CenconError;
use crate::state_manager::StateManager;

pub struct AppState {
    pub bus: Arc<EventBus>,
    pub state_manager: Arc<StateManager>,
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
        .route("/receiveKeyCode", post(receive_key_code))
        .route("/pleaseRespondToKeypad", post(please_respond_to_keypad))
        .route("/retrieveConsoleLogs", post(retrieve_console_logs))
        .route("/_health_status", get(health_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer::<AppState>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn receive_key_code(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let req: ReceiveKeyCodeRequest = match parse_json_body(&headers, &body) {
        Ok(req) => req,
        Err(reason) => return CenconError::BadRequest(reason).into_response(),
    };
    StateManager::submit_key_code(&state.bus, req.key_sequence).await;
    "Ok".into_response()
}

async fn please_respond_to_keypad(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    StateManager::submit_alive_ping_request(&state.bus).await;
    "Ok".into_response()
}

async fn retrieve_console_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let req: RetrieveConsoleLogsRequest = match parse_json_body(&headers, &body) {
        Ok(req) => req,
        Err(reason) => return CenconError::BadRequest(reason).into_response(),
    };
    if req.start_timestamp < 0.0 {
        return CenconError::BadRequest("startTimestamp must be >= 0").into_response();
    }
    let entries = state.logs.since(req.start_timestamp);
    axum::Json(RequestLogsResponse::from_entries(entries, req.start_timestamp)).into_response()
}

async fn health_status() -> impl IntoResponse {
    axum::Json(HealthResponse::default())
}
