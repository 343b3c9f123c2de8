//! Negotiation clock queries.

use serde::{Deserialize, Serialize};

use crate::error::{NegotiationError, Result};

/// Read-only view of the negotiation clock.
///
/// Units are up to the host (rounds, seconds); only the ratio matters.
pub trait Timeline {
    /// Time elapsed since the session started.
    fn current_time(&self) -> f64;

    /// Time budget of the session.
    fn total_time(&self) -> f64;
}

/// Fraction of the time budget still left: 1.0 at start, 0.0 at the deadline.
///
/// # Errors
///
/// Returns [`NegotiationError::DegenerateState`] if the total time is not
/// positive, and [`NegotiationError::InvalidInput`] if the current time is
/// negative, not finite, or past the deadline.
pub fn time_left_fraction(current_time: f64, total_time: f64) -> Result<f64> {
    if !total_time.is_finite() || total_time <= 0.0 {
        return Err(NegotiationError::degenerate(format!(
            "total time must be positive, got {total_time}"
        )));
    }
    if !current_time.is_finite() || current_time < 0.0 || current_time > total_time {
        return Err(NegotiationError::invalid_input(format!(
            "current time {current_time} outside [0, {total_time}]"
        )));
    }
    Ok((total_time - current_time) / total_time)
}

/// Normalized elapsed time of a [`Timeline`], in `[0, 1]`.
///
/// # Errors
///
/// See [`time_left_fraction`].
pub fn elapsed_fraction(timeline: &dyn Timeline) -> Result<f64> {
    time_left_fraction(timeline.current_time(), timeline.total_time()).map(|left| 1.0 - left)
}

/// A discrete round counter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundTimeline {
    round: u32,
    total_rounds: u32,
}

impl RoundTimeline {
    /// Creates a timeline at round 0.
    #[must_use]
    pub const fn new(total_rounds: u32) -> Self {
        Self {
            round: 0,
            total_rounds,
        }
    }

    /// Returns the current round.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Returns the round budget.
    #[must_use]
    pub const fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Returns true once the deadline is reached.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.round >= self.total_rounds
    }

    /// Moves to the next round. Stops at the deadline.
    pub fn advance(&mut self) {
        if self.round < self.total_rounds {
            self.round += 1;
        }
    }
}

impl Timeline for RoundTimeline {
    fn current_time(&self) -> f64 {
        f64::from(self.round)
    }

    fn total_time(&self) -> f64 {
        f64::from(self.total_rounds)
    }
}
