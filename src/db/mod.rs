//! Snapshot persistence.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - The append-only `SnapshotStore` seam and its SQLite `Repository`

pub mod migrations;
pub mod repo;

use crate::domain::{NewSnapshot, Snapshot};
use async_trait::async_trait;
use thiserror::Error;

pub use migrations::init_db;
pub use repo::Repository;

/// Append-only, recency-ordered log of points snapshots.
///
/// There is deliberately no update or delete: every computed
/// `min_points_needed` stays on record.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a new snapshot, assigning `id` and (when absent) `created_at`.
    async fn append(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError>;

    /// Up to `n` most recent snapshots, strictly descending by `(created_at, id)`.
    async fn latest(&self, n: u32) -> Result<Vec<Snapshot>, StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("Corrupt snapshot row {id}: {message}")]
    Corrupt { id: i64, message: String },
}
