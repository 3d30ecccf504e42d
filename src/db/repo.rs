//! SQLite-backed snapshot repository.

use super::{SnapshotStore, StoreError};
use crate::domain::{Decimal, NewSnapshot, Snapshot, TimeMs};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    #[cfg(test)]
    pub(crate) async fn count_snapshots(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM points_stats")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl SnapshotStore for Repository {
    async fn append(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError> {
        let created_at = snapshot.created_at.unwrap_or_else(TimeMs::now);

        let result = sqlx::query(
            r#"
            INSERT INTO points_stats (created_at, total_points, min_points_needed)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(created_at.as_i64())
        .bind(snapshot.total_points.to_canonical_string())
        .bind(snapshot.min_points_needed.to_canonical_string())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, created_at = created_at.as_i64(), "Appended points snapshot");

        Ok(Snapshot {
            id,
            created_at,
            total_points: snapshot.total_points,
            min_points_needed: snapshot.min_points_needed,
        })
    }

    async fn latest(&self, n: u32) -> Result<Vec<Snapshot>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, created_at, total_points, min_points_needed
            FROM points_stats
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(n))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snapshot_from_row).collect()
    }
}

fn snapshot_from_row(row: &SqliteRow) -> Result<Snapshot, StoreError> {
    let id: i64 = row.get("id");
    let total_str: String = row.get("total_points");
    let min_str: Option<String> = row.get("min_points_needed");

    let total_points = Decimal::from_str_canonical(&total_str).map_err(|e| StoreError::Corrupt {
        id,
        message: format!("total_points {:?}: {}", total_str, e),
    })?;

    // Legacy rows may carry NULL here.
    let min_points_needed = match min_str {
        Some(s) => Decimal::from_str_canonical(&s).map_err(|e| StoreError::Corrupt {
            id,
            message: format!("min_points_needed {:?}: {}", s, e),
        })?,
        None => Decimal::zero(),
    };

    Ok(Snapshot {
        id,
        created_at: TimeMs::new(row.get("created_at")),
        total_points,
        min_points_needed,
    })
}
