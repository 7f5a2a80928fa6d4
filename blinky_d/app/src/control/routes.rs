use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{ActiveSettings, BlinkStats, SettingsHandle, SettingsUpdate};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct DetectionStatus {
    pub detection_available: bool,
    pub reason: Option<String>,
}

impl Default for DetectionStatus {
    fn default() -> Self {
        Self {
            detection_available: true,
            reason: None,
        }
    }
}

#[derive(Clone)]
pub struct ControlState {
    pub settings: SettingsHandle,
    pub stats: Arc<RwLock<Option<BlinkStats>>>,
    pub status: Arc<RwLock<DetectionStatus>>,
    pub continue_request: Arc<AtomicBool>,
}

pub fn get_router(state: ControlState) -> Router {
    Router::new()
        .route("/settings", get(get_settings_handler).post(post_settings_handler))
        .route("/stats", get(stats_handler))
        .route("/status", get(status_handler))
        .route("/break/continue", post(continue_break_handler))
        .with_state(state)
}

fn settings_body(active: &ActiveSettings) -> Value {
    json!({
        "mode": active.mode,
        "description": active.mode.map(|m| m.description()),
        "settings": active.settings,
    })
}

pub async fn get_settings_handler(State(state): State<ControlState>) -> Json<Value> {
    let active = state.settings.snapshot();
    Json(json!({
        "status": "ok",
        "active": settings_body(&active),
    }))
}

fn error_reply(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "status": "error",
            "message": message,
        })),
    )
}

/// Queues the update; the engine picks it up before its next frame.
///
/// Malformed bodies and unknown modes get the same JSON error as rejected thresholds.
pub async fn post_settings_handler(
    State(state): State<ControlState>,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let update = match payload {
        Ok(Json(update)) => update,
        Err(rejection) => {
            log::warn!("Rejected settings request: {}", rejection.body_text());
            return error_reply(rejection.body_text());
        }
    };

    match state.settings.post(update) {
        Ok(()) => {
            log::info!("Queued settings update: {:?}", update);
            (
                StatusCode::ACCEPTED,
                Json(json!({
                    "status": "queued",
                    "requested": update,
                })),
            )
        }
        Err(e) => error_reply(e.to_string()),
    }
}

pub async fn stats_handler(State(state): State<ControlState>) -> Json<Value> {
    let stats = state.stats.read().ok().and_then(|s| *s);
    Json(json!({
        "status": "ok",
        "stats": stats,
    }))
}

pub async fn status_handler(State(state): State<ControlState>) -> Json<Value> {
    let status = state
        .status
        .read()
        .map(|s| s.clone())
        .unwrap_or_default();
    Json(json!({
        "status": "ok",
        "detection": status,
    }))
}

pub async fn continue_break_handler(State(state): State<ControlState>) -> Json<Value> {
    state.continue_request.store(true, Ordering::SeqCst);
    Json(json!({
        "status": "requested",
    }))
}
