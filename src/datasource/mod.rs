//! Read-only access to the external reward program's points figures.

use crate::domain::{Address, Decimal, ParticipantFigures};
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod resolv;

pub use mock::MockPointsSource;
pub use resolv::ResolvPointsSource;

/// External points source.
///
/// Implementations perform a single attempt per call; retrying is left to
/// whoever schedules ingestion.
#[async_trait]
pub trait PointsSource: Send + Sync + fmt::Debug {
    /// Current aggregate total across all participants.
    async fn fetch_global_total(&self) -> Result<Decimal, DataSourceError>;

    /// Current figures for one participant.
    ///
    /// Returns `DataSourceError::NotFound` when the address is unknown upstream.
    async fn fetch_participant(
        &self,
        address: &Address,
    ) -> Result<ParticipantFigures, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// Non-success HTTP status other than 404
    HttpError { status: u16, message: String },
    /// Invalid JSON or a response missing a required field
    ParseError(String),
    /// The participant address is unknown upstream
    NotFound(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::NotFound(addr) => write!(f, "Unknown participant: {}", addr),
        }
    }
}

impl std::error::Error for DataSourceError {}
