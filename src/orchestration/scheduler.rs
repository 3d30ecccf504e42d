//! Optional in-process ingestion timer.
//!
//! Deployments normally trigger `/ingest` from an external scheduler; this
//! loop covers single-binary deployments that have none.

use super::Ingestor;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Run `ingestor` every `period`, starting immediately.
///
/// A failed cycle is logged and the loop continues with the next tick; there
/// is no retry within a period.
pub fn spawn_periodic(ingestor: Ingestor, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "Starting periodic ingestion");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = ingestor.run_cycle().await {
                error!(error = %e, "Scheduled ingestion cycle failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockPointsSource;
    use crate::db::{SnapshotStore, StoreError};
    use crate::domain::{Decimal, NewSnapshot, Snapshot, TimeMs};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Keeps the loop free of blocking I/O so the paused clock decides every tick.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<Snapshot>>,
    }

    impl MemoryStore {
        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        async fn append(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let stored = Snapshot {
                id: rows.len() as i64 + 1,
                created_at: snapshot.created_at.unwrap_or_else(TimeMs::now),
                total_points: snapshot.total_points,
                min_points_needed: snapshot.min_points_needed,
            };
            rows.push(stored.clone());
            Ok(stored)
        }

        async fn latest(&self, n: u32) -> Result<Vec<Snapshot>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().rev().take(n as usize).cloned().collect())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_ingestion_runs_once_per_period() {
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(MockPointsSource::new().with_total(Decimal::from(1000_i64)));
        let ingestor = Ingestor::new(source, store.clone());

        let handle = spawn_periodic(ingestor, Duration::from_secs(60));

        // First tick fires immediately.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.len(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.len(), 1);

        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.len(), 2);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_does_not_stop_the_loop() {
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(
            MockPointsSource::new()
                .failing_global(crate::datasource::DataSourceError::NetworkError("down".into())),
        );
        let ingestor = Ingestor::new(source, store.clone());

        let handle = spawn_periodic(ingestor, Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(150)).await;

        assert!(!handle.is_finished());
        assert_eq!(store.len(), 0);
        handle.abort();
    }
}
