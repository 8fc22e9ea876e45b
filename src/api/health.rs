use crate::api::AppState;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Reports the server-wide settings every analytics request inherits.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ready",
        "pnlMode": state.config.pnl_mode,
        "excludedTradeIds": state.config.excluded_trade_ids.len(),
    }))
}
