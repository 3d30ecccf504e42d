use crate::api::AppState;
use crate::domain::Decimal;
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsStatsResponse {
    pub today: Decimal,
    pub yesterday: Decimal,
    pub change: Decimal,
    pub change_percentage: Decimal,
}

pub async fn get_points_stats(
    State(state): State<AppState>,
) -> Result<Json<PointsStatsResponse>, AppError> {
    let stats = state.queries.points_stats().await?;
    Ok(Json(PointsStatsResponse {
        today: stats.today,
        yesterday: stats.yesterday,
        change: stats.change,
        change_percentage: stats.change_percentage,
    }))
}
