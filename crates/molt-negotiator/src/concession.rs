//! Time-dependent concession.
//!
//! The [`ConcessionScheduler`] answers "how much utility am I still willing
//! to ask for (or accept) at this point in time". Two smooth decay shapes are
//! available, plus a discount-aware rule that takes over when the domain's
//! time discount makes delay expensive.

use tracing::trace;

use crate::config::{ConcessionConfig, ConcessionCurve, CurveBase};
use crate::error::{NegotiationError, Result};
use crate::timeline::time_left_fraction;

/// Utility assumed for our own first bid before we have bid.
pub const NOMINAL_MAX_UTILITY: f64 = 1.0;

/// Everything a concession target depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcessionInput {
    /// Time elapsed.
    pub current_time: f64,
    /// Time budget.
    pub total_time: f64,
    /// Best utility we can achieve (the concession ceiling).
    pub my_best_utility: f64,
    /// Utility to us of the opponent's best offer so far.
    pub opponent_best_utility: f64,
    /// Utility of our own first bid; `None` before our first bid.
    pub my_first_bid_utility: Option<f64>,
    /// Time-discount multiplier, 1.0 = no discount.
    pub discount_factor: f64,
}

impl ConcessionInput {
    /// Creates an undiscounted first-round input.
    #[must_use]
    pub const fn new(
        current_time: f64,
        total_time: f64,
        my_best_utility: f64,
        opponent_best_utility: f64,
    ) -> Self {
        Self {
            current_time,
            total_time,
            my_best_utility,
            opponent_best_utility,
            my_first_bid_utility: None,
            discount_factor: 1.0,
        }
    }

    /// Sets the utility of our first bid.
    #[must_use]
    pub const fn with_my_first_bid_utility(mut self, utility: f64) -> Self {
        self.my_first_bid_utility = Some(utility);
        self
    }

    /// Sets the discount factor.
    #[must_use]
    pub const fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    fn validate(&self) -> Result<()> {
        let utilities = [
            ("my best utility", Some(self.my_best_utility)),
            ("opponent best utility", Some(self.opponent_best_utility)),
            ("my first bid utility", self.my_first_bid_utility),
            ("discount factor", Some(self.discount_factor)),
        ];
        for (name, value) in utilities {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(NegotiationError::invalid_input(format!(
                        "{name} must be in [0, 1], got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Computes target utilities from a [`ConcessionConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcessionScheduler {
    config: ConcessionConfig,
}

impl ConcessionScheduler {
    /// Creates a scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] if the config is invalid.
    pub fn new(config: ConcessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ConcessionConfig {
        &self.config
    }

    /// The lowest utility worth offering or accepting right now.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::DegenerateState`] for a non-positive total
    /// time and [`NegotiationError::InvalidInput`] for out-of-range inputs.
    pub fn target_utility(&self, input: &ConcessionInput) -> Result<f64> {
        input.validate()?;
        let left = time_left_fraction(input.current_time, input.total_time)?;

        let best = input.my_best_utility;
        let opponent_best = input.opponent_best_utility;
        let diff = best - opponent_best;
        if diff < 0.0 {
            return Ok(best);
        }

        if input.discount_factor < self.config.discount_threshold {
            let concession = (self.config.discount_pivot - input.discount_factor).max(0.0);
            let target = (self.minimum_offer(input) - concession).clamp(0.0, best);
            trace!(target, concession, "discount-aware concession");
            return Ok(target);
        }

        if self.config.final_window > 0.0 && left <= self.config.final_window {
            return Ok(self.minimum_offer(input).min(best));
        }

        let target = match self.config.curve {
            ConcessionCurve::Quadratic => {
                let floor = best / self.config.boundary_ratio;
                (best - diff * (1.0 - left).powi(2)).clamp(floor, best)
            }
            ConcessionCurve::SquareRoot => {
                let base = match self.config.curve_base {
                    CurveBase::OpponentBest => opponent_best,
                    CurveBase::MinimumOffer => self.minimum_offer(input),
                };
                (base + (left * diff).sqrt()).min(best)
            }
        };
        trace!(target, time_left = left, "time-dependent concession");
        Ok(target)
    }

    /// `max(my_first_bid / boundary_ratio, opponent_best)`.
    #[must_use]
    pub fn minimum_offer(&self, input: &ConcessionInput) -> f64 {
        let first = input.my_first_bid_utility.unwrap_or(NOMINAL_MAX_UTILITY);
        (first / self.config.boundary_ratio).max(input.opponent_best_utility)
    }
}
