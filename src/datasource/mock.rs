//! Mock points source for testing without network calls.

use super::{DataSourceError, PointsSource};
use crate::domain::{Address, Decimal, ParticipantFigures};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock source returning predefined figures.
///
/// Global totals are served from a queue so a test can script successive
/// ingestion cycles; the last value repeats once the queue drains.
#[derive(Debug, Clone, Default)]
pub struct MockPointsSource {
    totals: Arc<Mutex<VecDeque<Decimal>>>,
    participants: HashMap<Address, (Decimal, Decimal)>,
    fail_global: Option<DataSourceError>,
    participant_calls: Arc<AtomicUsize>,
}

impl MockPointsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a global total for the next `fetch_global_total` call.
    pub fn with_total(self, total: Decimal) -> Self {
        self.totals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(total);
        self
    }

    /// Register a participant's (period, total) figures.
    pub fn with_participant(mut self, address: &str, period: Decimal, total: Decimal) -> Self {
        self.participants
            .insert(Address::new(address.to_string()), (period, total));
        self
    }

    /// Make every `fetch_global_total` call fail with `err`.
    pub fn failing_global(mut self, err: DataSourceError) -> Self {
        self.fail_global = Some(err);
        self
    }

    /// How many times `fetch_participant` has been called.
    pub fn participant_calls(&self) -> usize {
        self.participant_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PointsSource for MockPointsSource {
    async fn fetch_global_total(&self) -> Result<Decimal, DataSourceError> {
        if let Some(err) = &self.fail_global {
            return Err(err.clone());
        }

        let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        match totals.len() {
            0 => Err(DataSourceError::ParseError(
                "no total configured".to_string(),
            )),
            1 => Ok(totals[0]),
            _ => Ok(totals.pop_front().unwrap_or_default()),
        }
    }

    async fn fetch_participant(
        &self,
        address: &Address,
    ) -> Result<ParticipantFigures, DataSourceError> {
        self.participant_calls.fetch_add(1, Ordering::SeqCst);

        self.participants
            .get(address)
            .map(|(period, total)| ParticipantFigures::new(address.clone(), *period, *total))
            .ok_or_else(|| DataSourceError::NotFound(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[tokio::test]
    async fn test_totals_are_served_in_order_and_last_repeats() {
        let mock = MockPointsSource::new()
            .with_total(d("1000"))
            .with_total(d("1100"));

        assert_eq!(mock.fetch_global_total().await.unwrap(), d("1000"));
        assert_eq!(mock.fetch_global_total().await.unwrap(), d("1100"));
        assert_eq!(mock.fetch_global_total().await.unwrap(), d("1100"));
    }

    #[tokio::test]
    async fn test_unknown_participant_is_not_found() {
        let mock = MockPointsSource::new().with_participant("0xabc", d("5"), d("50"));

        let known = mock
            .fetch_participant(&Address::new("0xabc".to_string()))
            .await
            .unwrap();
        assert_eq!(known.period_contribution, d("5"));
        assert_eq!(known.total_contribution, d("50"));

        let unknown = mock
            .fetch_participant(&Address::new("0xdef".to_string()))
            .await;
        assert!(matches!(unknown, Err(DataSourceError::NotFound(_))));
        assert_eq!(mock.participant_calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_global() {
        let mock = MockPointsSource::new()
            .with_total(d("1"))
            .failing_global(DataSourceError::NetworkError("down".to_string()));
        assert!(mock.fetch_global_total().await.is_err());
    }
}
