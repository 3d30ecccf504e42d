use crate::api::AppState;
use crate::error::AppError;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the snapshot store answers a read.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    // Insufficient history is still a ready service.
    match state.queries.min_points().await {
        Ok(_) | Err(crate::orchestration::QueryError::InsufficientData { .. }) => {
            Ok(Json(serde_json::json!({"status": "ready"})))
        }
        Err(e) => Err(e.into()),
    }
}
