use crate::api::AppState;
use crate::domain::Decimal;
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinPointsResponse {
    pub min_points_needed: Decimal,
}

pub async fn get_min_points(
    State(state): State<AppState>,
) -> Result<Json<MinPointsResponse>, AppError> {
    let min_points_needed = state.queries.min_points().await?;
    Ok(Json(MinPointsResponse { min_points_needed }))
}
