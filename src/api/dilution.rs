//! Per-participant dilution between the two most recent snapshots.

use crate::api::AppState;
use crate::domain::Decimal;
use crate::engine::DilutionMode;
use crate::error::AppError;
use crate::orchestration::DilutionReport;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DilutionQuery {
    pub address: Option<String>,
    /// Overrides the deployment's `DILUTION_MODE` for this request.
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DilutionResponse {
    pub address: String,
    pub mode: DilutionMode,
    /// Points earned by the participant this period.
    pub current_points: Decimal,
    pub total_points: Decimal,
    /// Two fractional digits, e.g. `"-3.18"`.
    pub dilution_percentage: String,
    pub min_points_needed: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dilution_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_share_today: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_share_yesterday: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_points_for_zero_dilution: Option<Decimal>,
    pub dates: SnapshotDates,
}

#[derive(Debug, Serialize)]
pub struct SnapshotDates {
    pub today: String,
    pub yesterday: String,
}

impl From<DilutionReport> for DilutionResponse {
    fn from(report: DilutionReport) -> Self {
        let DilutionReport {
            figures,
            result,
            today,
            yesterday,
        } = report;

        DilutionResponse {
            address: figures.address.to_string(),
            mode: result.mode,
            current_points: figures.period_contribution,
            total_points: figures.total_contribution,
            dilution_percentage: result.dilution_percentage.to_fixed(2),
            min_points_needed: result.min_points_needed,
            dilution_rate: result.dilution_rate,
            user_share_today: result.user_share_today,
            user_share_yesterday: result.user_share_yesterday,
            min_points_for_zero_dilution: result.min_points_for_zero_dilution,
            dates: SnapshotDates {
                today: today.created_at.to_rfc3339(),
                yesterday: yesterday.created_at.to_rfc3339(),
            },
        }
    }
}

pub async fn get_dilution(
    Query(params): Query<DilutionQuery>,
    State(state): State<AppState>,
) -> Result<Json<DilutionResponse>, AppError> {
    let mode = params
        .mode
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<DilutionMode>)
        .transpose()
        .map_err(|msg| AppError::BadRequest(format!("Invalid mode: {}", msg)))?;

    let report = state
        .queries
        .dilution(params.address.as_deref(), mode)
        .await?;

    Ok(Json(report.into()))
}
