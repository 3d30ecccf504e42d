//! Read-side operations over the two most recent snapshots.

use crate::datasource::{DataSourceError, PointsSource};
use crate::db::{SnapshotStore, StoreError};
use crate::domain::{Address, Decimal, ParticipantFigures, Snapshot};
use crate::engine::{self, DilutionMode, DilutionResult, EngineError, PointsStats};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct QueryService {
    source: Arc<dyn PointsSource>,
    store: Arc<dyn SnapshotStore>,
    default_mode: DilutionMode,
}

/// Dilution figures together with the inputs they were derived from.
#[derive(Debug, Clone)]
pub struct DilutionReport {
    pub figures: ParticipantFigures,
    pub result: DilutionResult,
    pub today: Snapshot,
    pub yesterday: Snapshot,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Insufficient data: {available} snapshot(s) stored, 2 required")]
    InsufficientData { available: usize },
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Upstream error: {0}")]
    Upstream(#[from] DataSourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl QueryService {
    pub fn new(
        source: Arc<dyn PointsSource>,
        store: Arc<dyn SnapshotStore>,
        default_mode: DilutionMode,
    ) -> Self {
        Self {
            source,
            store,
            default_mode,
        }
    }

    /// The minimum-points figure recorded on the current snapshot.
    pub async fn min_points(&self) -> Result<Decimal, QueryError> {
        let (today, _yesterday) = self.latest_pair().await?;
        Ok(today.min_points_needed)
    }

    pub async fn points_stats(&self) -> Result<PointsStats, QueryError> {
        let (today, yesterday) = self.latest_pair().await?;
        Ok(engine::points_stats(&today, &yesterday)?)
    }

    /// Dilution for one participant, in `mode` or the deployment default.
    ///
    /// The address is validated before any store or upstream access. An
    /// address unknown upstream is scored as a zero contribution.
    pub async fn dilution(
        &self,
        address: Option<&str>,
        mode: Option<DilutionMode>,
    ) -> Result<DilutionReport, QueryError> {
        let address = address
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Address::new(s.to_string()))
            .ok_or(QueryError::MissingParameter("address"))?;

        let (today, yesterday) = self.latest_pair().await?;

        let figures = match self.source.fetch_participant(&address).await {
            Ok(figures) => figures,
            Err(DataSourceError::NotFound(_)) => {
                warn!(address = %address, "Participant unknown upstream, scoring as zero contribution");
                ParticipantFigures::unknown(address)
            }
            Err(e) => return Err(e.into()),
        };

        let mode = mode.unwrap_or(self.default_mode);
        let result = engine::compute_dilution(mode, &today, &yesterday, &figures)?;
        debug!(
            address = %figures.address,
            %mode,
            dilution = %result.dilution_percentage,
            "Computed dilution"
        );

        Ok(DilutionReport {
            figures,
            result,
            today,
            yesterday,
        })
    }

    async fn latest_pair(&self) -> Result<(Snapshot, Snapshot), QueryError> {
        let mut latest = self.store.latest(2).await?.into_iter();
        match (latest.next(), latest.next()) {
            (Some(today), Some(yesterday)) => Ok((today, yesterday)),
            (first, _) => Err(QueryError::InsufficientData {
                available: usize::from(first.is_some()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockPointsSource;
    use crate::db::{init_db, Repository};
    use crate::domain::{NewSnapshot, TimeMs};
    use tempfile::TempDir;

    async fn setup_repo() -> (Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Arc::new(Repository::new(pool)), temp_dir)
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    async fn seed(repo: &Repository, entries: &[(i64, &str, &str)]) {
        for (at, total, min) in entries {
            repo.append(NewSnapshot::new(d(total), d(min)).at(TimeMs::new(*at)))
                .await
                .unwrap();
        }
    }

    fn mock() -> Arc<MockPointsSource> {
        Arc::new(MockPointsSource::new().with_participant("0xabc", d("50"), d("200")))
    }

    #[tokio::test]
    async fn test_insufficient_data_until_two_snapshots() {
        let (repo, _temp) = setup_repo().await;
        let service = QueryService::new(mock(), repo.clone(), DilutionMode::Share);

        for expected in [0usize, 1] {
            match service.min_points().await {
                Err(QueryError::InsufficientData { available }) => assert_eq!(available, expected),
                other => panic!("Expected InsufficientData, got {:?}", other),
            }
            assert!(matches!(
                service.dilution(Some("0xabc"), None).await,
                Err(QueryError::InsufficientData { .. })
            ));
            seed(&repo, &[(1000 * (expected as i64 + 1), "1000", "0")]).await;
        }

        assert_eq!(service.min_points().await.unwrap(), d("0"));
        assert!(service.dilution(Some("0xabc"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_min_points_echoes_current_snapshot() {
        let (repo, _temp) = setup_repo().await;
        seed(&repo, &[(1000, "1000", "0"), (2000, "1100", "10")]).await;
        let service = QueryService::new(mock(), repo, DilutionMode::Aggregate);

        assert_eq!(service.min_points().await.unwrap(), d("10"));
    }

    #[tokio::test]
    async fn test_points_stats() {
        let (repo, _temp) = setup_repo().await;
        seed(&repo, &[(1000, "1000", "0"), (2000, "1100", "10")]).await;
        let service = QueryService::new(mock(), repo, DilutionMode::Aggregate);

        let stats = service.points_stats().await.unwrap();
        assert_eq!(stats.today, d("1100"));
        assert_eq!(stats.yesterday, d("1000"));
        assert_eq!(stats.change, d("100"));
        assert_eq!(stats.change_percentage, d("10"));
    }

    #[tokio::test]
    async fn test_missing_address_fails_before_upstream() {
        let (repo, _temp) = setup_repo().await;
        let source = mock();
        let service = QueryService::new(source.clone(), repo, DilutionMode::Share);

        for address in [None, Some(""), Some("  ")] {
            assert!(matches!(
                service.dilution(address, None).await,
                Err(QueryError::MissingParameter("address"))
            ));
        }
        assert_eq!(source.participant_calls(), 0);
    }

    #[tokio::test]
    async fn test_dilution_uses_default_and_override_modes() {
        let (repo, _temp) = setup_repo().await;
        seed(&repo, &[(1000, "1000", "0"), (2000, "1100", "10")]).await;
        let service = QueryService::new(mock(), repo, DilutionMode::Share);

        let share = service.dilution(Some("0xabc"), None).await.unwrap();
        assert_eq!(share.result.mode, DilutionMode::Share);
        assert_eq!(share.result.min_points_for_zero_dilution, Some(d("20")));
        assert_eq!(share.today.total_points, d("1100"));
        assert_eq!(share.yesterday.total_points, d("1000"));

        let aggregate = service
            .dilution(Some("0xabc"), Some(DilutionMode::Aggregate))
            .await
            .unwrap();
        assert_eq!(aggregate.result.mode, DilutionMode::Aggregate);
        assert_eq!(aggregate.result.dilution_percentage, d("-10"));
    }

    #[tokio::test]
    async fn test_unknown_participant_degrades_to_zero() {
        let (repo, _temp) = setup_repo().await;
        seed(&repo, &[(1000, "1000", "0"), (2000, "1100", "10")]).await;
        let service = QueryService::new(mock(), repo, DilutionMode::Aggregate);

        let report = service.dilution(Some("0xnobody"), None).await.unwrap();
        assert_eq!(report.figures.period_contribution, Decimal::zero());
        assert_eq!(report.result.dilution_percentage, Decimal::zero());
    }

    #[tokio::test]
    async fn test_zero_baseline_is_division_hazard() {
        let (repo, _temp) = setup_repo().await;
        seed(&repo, &[(1000, "0", "0"), (2000, "1100", "0")]).await;
        let service = QueryService::new(mock(), repo, DilutionMode::Share);

        assert!(matches!(
            service.points_stats().await,
            Err(QueryError::Engine(EngineError::DivisionHazard(_)))
        ));
        assert!(matches!(
            service.dilution(Some("0xabc"), None).await,
            Err(QueryError::Engine(EngineError::DivisionHazard(_)))
        ));
    }
}
