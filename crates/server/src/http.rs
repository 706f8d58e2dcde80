//! Room-control REST API (spec.md §6.4-6.5): thin axum handlers translating
//! JSON bodies into `debate_registry::api` requests and calling straight
//! through to the shared `Registry`. No business logic lives here — it
//! belongs in the crates below, the way the teacher's `create_router`
//! (`server/src/http.rs`) is a pure routing table over `AppState`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use debate_registry::api::{self, CreateRoomRequest, SubmitUserMessageRequest};

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::map_core_error;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/:room_id", get(get_snapshot))
        .route("/api/rooms/:room_id", axum::routing::delete(end_room))
        .route("/api/rooms/:room_id/messages", post(submit_user_message))
        .route("/api/rooms/:room_id/advance", post(advance_turn))
        .route("/api/stats", get(stats))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/admin/reload-config", post(reload_config))
        .route("/ws/:room_id", get(crate::websocket::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

fn core_error_response(err: debate_core::Error) -> (StatusCode, Json<ErrorBody>) {
    let status = map_core_error(&err);
    (status, Json(ErrorBody { error: err.to_string(), kind: err.kind() }))
}

async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<api::CreateRoomResponse>, (StatusCode, Json<ErrorBody>)> {
    let room_id = state.registry.create(req).await.map_err(core_error_response)?;
    Ok(Json(api::CreateRoomResponse { room_id }))
}

async fn get_snapshot(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<debate_core::DebateRoom>, (StatusCode, Json<ErrorBody>)> {
    let handle = state.registry.get(&room_id).map_err(core_error_response)?;
    let snapshot = handle.snapshot().await.map_err(core_error_response)?;
    Ok(Json(snapshot))
}

async fn submit_user_message(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<SubmitUserMessageRequest>,
) -> Result<Json<api::Accepted>, (StatusCode, Json<ErrorBody>)> {
    let handle = state.registry.get(&room_id).map_err(core_error_response)?;
    handle.submit_user_message(&req.user_id, req.text).await.map_err(core_error_response)?;
    Ok(Json(api::Accepted { accepted: true }))
}

async fn advance_turn(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<api::AdvanceTurnOutcome>, (StatusCode, Json<ErrorBody>)> {
    let handle = state.registry.get(&room_id).map_err(core_error_response)?;
    let outcome = api::advance_turn(&handle).await.map_err(core_error_response)?;
    Ok(Json(outcome))
}

async fn end_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<api::Ended>, (StatusCode, Json<ErrorBody>)> {
    state.registry.end(&room_id, "manual").await.map_err(core_error_response)?;
    Ok(Json(api::Ended { ended: true }))
}

async fn stats(State(state): State<AppState>) -> Json<api::Stats> {
    Json(state.registry.stats())
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn reload_config(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    state.reload_config().map_err(|message| {
        (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message, kind: "CONFIG_INVALID" }))
    })?;
    Ok(StatusCode::OK)
}
