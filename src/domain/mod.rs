//! Domain types for the points dilution tracker.
//!
//! - Lossless numeric handling via the Decimal wrapper
//! - Primitives: TimeMs, Address
//! - Snapshot (persisted) and ParticipantFigures (transient)

pub mod decimal;
pub mod participant;
pub mod primitives;
pub mod snapshot;

pub use decimal::Decimal;
pub use participant::ParticipantFigures;
pub use primitives::{Address, TimeMs};
pub use snapshot::{NewSnapshot, Snapshot};
