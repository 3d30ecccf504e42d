//! Dilution engine.
//!
//! Every function here is a pure function of its inputs. Two formula versions
//! coexist and are selected through [`DilutionMode`]:
//!
//! - **Aggregate** (legacy): a participant who earned anything this period is
//!   assigned the negative of the global growth rate, as a percentage.
//! - **Share** (revised): compares the participant's percentage ownership of
//!   the pool at the previous and current snapshot.
//!
//! All arithmetic is exact decimal. Percentages are `value * 100`. Nothing is
//! clamped. A zero divisor is reported as [`EngineError::DivisionHazard`]
//! instead of producing an infinite or undefined figure, and a result outside
//! the decimal range as [`EngineError::Overflow`].

use crate::domain::{Decimal, ParticipantFigures, Snapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DilutionMode {
    /// Mode A: systemic dilution from the global growth rate.
    Aggregate,
    /// Mode B: change in the participant's own share of the pool.
    Share,
}

impl DilutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DilutionMode::Aggregate => "aggregate",
            DilutionMode::Share => "share",
        }
    }
}

impl fmt::Display for DilutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DilutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggregate" | "a" => Ok(DilutionMode::Aggregate),
            "share" | "b" => Ok(DilutionMode::Share),
            other => Err(format!("must be aggregate or share, got {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Division hazard: {0} total is zero")]
    DivisionHazard(&'static str),
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

/// Participant-facing dilution figures for one snapshot pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DilutionResult {
    pub mode: DilutionMode,
    /// Signed percentage. In aggregate mode negative means the pool grew; in
    /// share mode positive means the participant's share shrank.
    pub dilution_percentage: Decimal,
    /// Echoed from the current snapshot, never recomputed here.
    pub min_points_needed: Decimal,
    /// Global growth rate as a fraction (aggregate mode only).
    pub dilution_rate: Option<Decimal>,
    pub user_share_today: Option<Decimal>,
    pub user_share_yesterday: Option<Decimal>,
    /// Period contribution that would have held the share constant (share mode only).
    pub min_points_for_zero_dilution: Option<Decimal>,
}

/// Change of the global total between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsStats {
    pub today: Decimal,
    pub yesterday: Decimal,
    pub change: Decimal,
    pub change_percentage: Decimal,
}

fn sub(lhs: Decimal, rhs: Decimal, what: &'static str) -> Result<Decimal, EngineError> {
    lhs.checked_sub(rhs).ok_or(EngineError::Overflow(what))
}

fn mul(lhs: Decimal, rhs: Decimal, what: &'static str) -> Result<Decimal, EngineError> {
    lhs.checked_mul(rhs).ok_or(EngineError::Overflow(what))
}

/// A zero divisor is a hazard named after the snapshot it came from; any other
/// `None` from the division is an overflow.
fn div(
    numerator: Decimal,
    divisor: Decimal,
    divisor_name: &'static str,
    what: &'static str,
) -> Result<Decimal, EngineError> {
    if divisor.is_zero() {
        return Err(EngineError::DivisionHazard(divisor_name));
    }
    numerator
        .checked_div(divisor)
        .ok_or(EngineError::Overflow(what))
}

fn percent(value: Decimal, what: &'static str) -> Result<Decimal, EngineError> {
    mul(value, Decimal::hundred(), what)
}

/// `(current - previous) / previous`.
pub fn growth_rate(current: Decimal, previous: Decimal) -> Result<Decimal, EngineError> {
    let delta = sub(current, previous, "growth rate")?;
    div(delta, previous, "previous", "growth rate")
}

/// Minimum-points figure stored on a new snapshot at ingestion time:
/// `ceil(growth_rate * 100)`.
///
/// No previous snapshot yields 0: the first cycle has no baseline.
pub fn ingestion_min_points(
    current_total: Decimal,
    previous: Option<&Snapshot>,
) -> Result<Decimal, EngineError> {
    match previous {
        None => Ok(Decimal::zero()),
        Some(prev) => {
            let rate = growth_rate(current_total, prev.total_points)?;
            Ok(percent(rate, "min points needed")?.ceil())
        }
    }
}

/// Mode A.
pub fn aggregate_dilution(
    today: &Snapshot,
    yesterday: &Snapshot,
    participant: &ParticipantFigures,
) -> Result<DilutionResult, EngineError> {
    let rate = growth_rate(today.total_points, yesterday.total_points)?;
    let dilution = if participant.period_contribution.is_positive() {
        -percent(rate, "dilution percentage")?
    } else {
        Decimal::zero()
    };

    Ok(DilutionResult {
        mode: DilutionMode::Aggregate,
        dilution_percentage: dilution,
        min_points_needed: today.min_points_needed,
        dilution_rate: Some(rate),
        user_share_today: None,
        user_share_yesterday: None,
        min_points_for_zero_dilution: None,
    })
}

/// Mode B.
///
/// `min_points_for_zero_dilution = ceil(total * (today - yesterday) / yesterday)`.
/// The division runs last so an integral answer never picks up a rounded
/// digit from a non-terminating pool ratio.
pub fn share_dilution(
    today: &Snapshot,
    yesterday: &Snapshot,
    participant: &ParticipantFigures,
) -> Result<DilutionResult, EngineError> {
    let total = participant.total_contribution;
    let baseline = sub(total, participant.period_contribution, "baseline holding")?;

    let share_today = percent(
        div(total, today.total_points, "current", "share today")?,
        "share today",
    )?;
    let share_yesterday = percent(
        div(baseline, yesterday.total_points, "previous", "share yesterday")?,
        "share yesterday",
    )?;
    let dilution = sub(share_yesterday, share_today, "dilution percentage")?;

    let pool_growth = sub(
        today.total_points,
        yesterday.total_points,
        "min points for zero dilution",
    )?;
    let min_for_zero = div(
        mul(total, pool_growth, "min points for zero dilution")?,
        yesterday.total_points,
        "previous",
        "min points for zero dilution",
    )?
    .ceil();

    Ok(DilutionResult {
        mode: DilutionMode::Share,
        dilution_percentage: dilution,
        min_points_needed: today.min_points_needed,
        dilution_rate: None,
        user_share_today: Some(share_today),
        user_share_yesterday: Some(share_yesterday),
        min_points_for_zero_dilution: Some(min_for_zero),
    })
}

pub fn compute_dilution(
    mode: DilutionMode,
    today: &Snapshot,
    yesterday: &Snapshot,
    participant: &ParticipantFigures,
) -> Result<DilutionResult, EngineError> {
    match mode {
        DilutionMode::Aggregate => aggregate_dilution(today, yesterday, participant),
        DilutionMode::Share => share_dilution(today, yesterday, participant),
    }
}

pub fn points_stats(today: &Snapshot, yesterday: &Snapshot) -> Result<PointsStats, EngineError> {
    let change = sub(today.total_points, yesterday.total_points, "change")?;
    let change_percentage = percent(
        div(change, yesterday.total_points, "previous", "change percentage")?,
        "change percentage",
    )?;

    Ok(PointsStats {
        today: today.total_points,
        yesterday: yesterday.total_points,
        change,
        change_percentage,
    })
}
