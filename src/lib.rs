pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{DataSourceError, MockPointsSource, PointsSource, ResolvPointsSource};
pub use db::{init_db, Repository, SnapshotStore, StoreError};
pub use domain::{Address, Decimal, NewSnapshot, ParticipantFigures, Snapshot, TimeMs};
pub use engine::{DilutionMode, DilutionResult, EngineError};
pub use error::AppError;
pub use orchestration::{Ingestor, QueryService};
