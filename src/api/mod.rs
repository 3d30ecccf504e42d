pub mod dilution;
pub mod health;
pub mod ingest;
pub mod min_points;
pub mod points_stats;

use crate::config::Config;
use crate::error::AppError;
use crate::orchestration::{Ingestor, QueryService};
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub queries: Arc<QueryService>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(config: Config, queries: Arc<QueryService>, ingestor: Arc<Ingestor>) -> Self {
        Self {
            config,
            queries,
            ingestor,
        }
    }
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/min-points", get(min_points::get_min_points))
        .route("/points-stats", get(points_stats::get_points_stats))
        .route("/dilution", get(dilution::get_dilution))
        .route(
            "/ingest",
            get(ingest::trigger_ingest).post(ingest::trigger_ingest),
        )
}

/// Build the router. Every route is served both at the root and under `/api`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(86_400));

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .fallback(invalid_endpoint)
        .layer(cors)
        .with_state(state)
}

async fn invalid_endpoint() -> AppError {
    AppError::NotFound
}
