//! Per-participant figures reported by the reward API. Not persisted.

use super::{Address, Decimal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantFigures {
    pub address: Address,
    /// Points earned since the previous snapshot ("daily points").
    pub period_contribution: Decimal,
    /// All-time total for this participant.
    pub total_contribution: Decimal,
}

impl ParticipantFigures {
    pub fn new(address: Address, period_contribution: Decimal, total_contribution: Decimal) -> Self {
        Self {
            address,
            period_contribution,
            total_contribution,
        }
    }

    /// Figures for an address the reward API does not know about.
    pub fn unknown(address: Address) -> Self {
        Self::new(address, Decimal::zero(), Decimal::zero())
    }
}
