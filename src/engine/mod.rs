//! Pure dilution arithmetic over consecutive snapshots.

pub mod dilution;

pub use dilution::{
    aggregate_dilution, compute_dilution, growth_rate, ingestion_min_points, points_stats,
    share_dilution, DilutionMode, DilutionResult, EngineError, PointsStats,
};
