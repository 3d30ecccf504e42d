//! Points snapshot: one timestamped sample of the reward program's global total.

use super::{Decimal, TimeMs};
use serde::Serialize;

/// A persisted snapshot. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: i64,
    pub created_at: TimeMs,
    pub total_points: Decimal,
    /// Ingestion-time minimum contribution; 0 for legacy rows and share-mode cycles.
    pub min_points_needed: Decimal,
}

/// A snapshot about to be appended. `created_at` is assigned by the store when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshot {
    pub created_at: Option<TimeMs>,
    pub total_points: Decimal,
    pub min_points_needed: Decimal,
}

impl NewSnapshot {
    pub fn new(total_points: Decimal, min_points_needed: Decimal) -> Self {
        Self {
            created_at: None,
            total_points,
            min_points_needed,
        }
    }

    pub fn at(mut self, created_at: TimeMs) -> Self {
        self.created_at = Some(created_at);
        self
    }
}
