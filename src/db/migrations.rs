//! Opening the snapshot database and bringing its schema up to date.
//!
//! Migrations are numbered and tracked in SQLite's `user_version` header, so a
//! database created before versioning existed (version 0, table already
//! present) walks through the same steps as a fresh file.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

struct Migration {
    version: i64,
    description: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "points_stats table and recency index",
        statements: &[
            "CREATE TABLE IF NOT EXISTS points_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                total_points TEXT NOT NULL,
                min_points_needed TEXT DEFAULT '0'
            )",
            "CREATE INDEX IF NOT EXISTS idx_points_stats_recency
                ON points_stats (created_at DESC, id DESC)",
        ],
    },
    Migration {
        version: 2,
        description: "backfill legacy NULL min_points_needed",
        statements: &[
            "UPDATE points_stats SET min_points_needed = '0' WHERE min_points_needed IS NULL",
        ],
    },
    Migration {
        version: 3,
        description: "append-only and non-negative total guards",
        statements: &[
            "CREATE TRIGGER IF NOT EXISTS points_stats_no_update
                BEFORE UPDATE ON points_stats
                BEGIN
                    SELECT RAISE(ABORT, 'points_stats is append-only');
                END",
            "CREATE TRIGGER IF NOT EXISTS points_stats_no_delete
                BEFORE DELETE ON points_stats
                BEGIN
                    SELECT RAISE(ABORT, 'points_stats is append-only');
                END",
            "CREATE TRIGGER IF NOT EXISTS points_stats_total_non_negative
                BEFORE INSERT ON points_stats
                WHEN CAST(NEW.total_points AS REAL) < 0
                BEGIN
                    SELECT RAISE(ABORT, 'total_points must be non-negative');
                END",
        ],
    },
];

/// Open (creating if needed) the snapshot database at `db_path` and migrate it.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let version = run_migrations(&pool).await?;
    info!(path = db_path, schema_version = version, "Snapshot database ready");
    Ok(pool)
}

/// Apply every migration newer than the stored `user_version`, each in its own
/// transaction. Returns the resulting version.
async fn run_migrations(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let mut current: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    for migration in MIGRATIONS.iter().filter(move |m| m.version > current) {
        let mut tx = pool.begin().await?;
        for statement in migration.statements.iter().copied() {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        // PRAGMA does not accept bound parameters.
        sqlx::query(&format!("PRAGMA user_version = {}", migration.version))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            version = migration.version,
            description = migration.description,
            "Applied snapshot migration"
        );
        current = migration.version;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn latest_version() -> i64 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    fn db_path(temp_dir: &TempDir) -> String {
        temp_dir
            .path()
            .join("points.db")
            .to_string_lossy()
            .to_string()
    }

    async fn user_version(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn insert(pool: &SqlitePool, created_at: i64, total: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO points_stats (created_at, total_points) VALUES (?, ?)")
            .bind(created_at)
            .bind(total)
            .execute(pool)
            .await
            .map(|_| ())
    }

    #[tokio::test]
    async fn test_fresh_database_reaches_latest_version() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&db_path(&temp_dir)).await.expect("init_db failed");

        assert_eq!(user_version(&pool).await, latest_version());

        let busy_timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(busy_timeout, 5000);

        insert(&pool, 1, "1000").await.unwrap();
        let min: String = sqlx::query_scalar("SELECT min_points_needed FROM points_stats")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(min, "0");
    }

    #[tokio::test]
    async fn test_unversioned_database_has_null_min_points_backfilled() {
        let temp_dir = TempDir::new().unwrap();
        let path = db_path(&temp_dir);

        // A database written before versioning: table present, user_version 0,
        // rows with NULL min_points_needed.
        let legacy = SqlitePoolOptions::new()
            .connect_with(SqliteConnectOptions::new().filename(&path).create_if_missing(true))
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE points_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                total_points TEXT NOT NULL,
                min_points_needed TEXT
            )",
        )
        .execute(&legacy)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO points_stats (created_at, total_points, min_points_needed)
             VALUES (1, '1000', NULL), (2, '1100', '10')",
        )
        .execute(&legacy)
        .await
        .unwrap();
        legacy.close().await;

        let pool = init_db(&path).await.expect("init_db failed");
        assert_eq!(user_version(&pool).await, latest_version());

        let mins: Vec<String> =
            sqlx::query_scalar("SELECT min_points_needed FROM points_stats ORDER BY id")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(mins, vec!["0".to_string(), "10".to_string()]);
    }

    #[tokio::test]
    async fn test_snapshots_cannot_be_updated_or_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&db_path(&temp_dir)).await.expect("init_db failed");
        insert(&pool, 1, "1000").await.unwrap();

        let update = sqlx::query("UPDATE points_stats SET total_points = '1'")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(update.to_string().contains("append-only"), "{}", update);

        let delete = sqlx::query("DELETE FROM points_stats")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(delete.to_string().contains("append-only"), "{}", delete);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points_stats")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_negative_total_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&db_path(&temp_dir)).await.expect("init_db failed");

        let err = insert(&pool, 1, "-0.5").await.unwrap_err();
        assert!(err.to_string().contains("non-negative"), "{}", err);
        insert(&pool, 2, "0").await.unwrap();
    }

    #[tokio::test]
    async fn test_reopening_keeps_history_and_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = db_path(&temp_dir);

        let pool = init_db(&path).await.expect("init_db failed");
        insert(&pool, 1, "1000").await.unwrap();
        pool.close().await;

        let pool = init_db(&path).await.expect("second init_db failed");
        assert_eq!(run_migrations(&pool).await.unwrap(), latest_version());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points_stats")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
