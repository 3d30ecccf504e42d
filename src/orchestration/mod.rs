//! Orchestration of the ingestion cycle and the read-side queries.

pub mod ingest;
pub mod query;
pub mod scheduler;

pub use ingest::{IngestionError, IngestionOutcome, Ingestor};
pub use query::{DilutionReport, QueryError, QueryService};
