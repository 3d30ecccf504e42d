//! Ingestion trigger, called by the external scheduler.

use crate::api::AppState;
use crate::domain::Decimal;
use crate::error::AppError;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum::Json;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub total_points: Decimal,
    pub min_points_needed: Decimal,
}

pub async fn trigger_ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<IngestResponse>, AppError> {
    if let Some(secret) = state.config.ingest_secret.as_deref() {
        if !bearer_matches(&headers, secret) {
            warn!("Rejected ingestion trigger with missing or invalid credential");
            return Err(AppError::Unauthorized);
        }
    }

    let outcome = state.ingestor.run_cycle().await?;

    Ok(Json(IngestResponse {
        success: true,
        total_points: outcome.total_points(),
        min_points_needed: outcome.min_points_needed,
    }))
}

/// Compares digests so the comparison length does not depend on the input.
fn bearer_matches(headers: &HeaderMap, secret: &str) -> bool {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if !token.is_empty() => {
            Sha256::digest(token.as_bytes()) == Sha256::digest(secret.as_bytes())
        }
        _ => false,
    }
}
