use crate::datasource::{DataSourceError, PointsSource};
use crate::db::{SnapshotStore, StoreError};
use crate::domain::{Decimal, NewSnapshot, Snapshot, TimeMs};
use crate::engine::{ingestion_min_points, EngineError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Runs one ingestion cycle: sample the global total, derive the
/// minimum-points figure against the previous snapshot, append a snapshot.
///
/// The figure does not depend on the query-side dilution mode, so a cycle
/// stores the same snapshot whichever default the deployment serves.
#[derive(Clone)]
pub struct Ingestor {
    source: Arc<dyn PointsSource>,
    store: Arc<dyn SnapshotStore>,
}

impl Ingestor {
    pub fn new(source: Arc<dyn PointsSource>, store: Arc<dyn SnapshotStore>) -> Self {
        Self { source, store }
    }

    /// Execute one cycle.
    ///
    /// Exactly one snapshot is appended on success and none on failure: the
    /// append is the last step and nothing before it writes.
    pub async fn run_cycle(&self) -> Result<IngestionOutcome, IngestionError> {
        let span = info_span!("ingest_cycle", cycle_id = %Uuid::new_v4());
        self.cycle().instrument(span).await
    }

    async fn cycle(&self) -> Result<IngestionOutcome, IngestionError> {
        let current_total = self.source.fetch_global_total().await?;

        let previous = self.store.latest(1).await?.into_iter().next();
        let baseline = previous.as_ref().filter(|prev| {
            if prev.total_points.is_zero() {
                warn!(
                    snapshot_id = prev.id,
                    "Previous snapshot total is zero; treating cycle as having no baseline"
                );
                false
            } else {
                true
            }
        });

        let min_points_needed = ingestion_min_points(current_total, baseline)?;

        let snapshot = self
            .store
            .append(NewSnapshot::new(current_total, min_points_needed).at(TimeMs::now()))
            .await?;

        info!(
            snapshot_id = snapshot.id,
            total_points = %current_total,
            previous_total = ?previous.as_ref().map(|p| p.total_points.to_string()),
            min_points_needed = %min_points_needed,
            "Ingestion cycle complete"
        );

        Ok(IngestionOutcome {
            snapshot,
            min_points_needed,
        })
    }
}

#[derive(Debug)]
pub struct IngestionOutcome {
    pub snapshot: Snapshot,
    pub min_points_needed: Decimal,
}

impl IngestionOutcome {
    pub fn total_points(&self) -> Decimal {
        self.snapshot.total_points
    }
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] DataSourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
