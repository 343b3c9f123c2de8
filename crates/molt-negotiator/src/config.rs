//! Agent configuration.
//!
//! Every behavioral variant of the engine is a configuration value rather
//! than a separate type: the concession curve, the boundary ratios, the
//! reference-bid weights, the sampling bias and the bid picking mode.
//!
//! Configuration is plain serde data with builder methods. Missing JSON
//! fields take the defaults of their own struct.

use serde::{Deserialize, Serialize};

use crate::error::{NegotiationError, Result};

/// Shape of the time-dependent target utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcessionCurve {
    /// Slow concession early, fast near the deadline.
    #[default]
    Quadratic,
    /// Fast concession early, slow near the deadline.
    SquareRoot,
}

/// What the square-root curve concedes towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CurveBase {
    /// The opponent's best offer so far.
    #[default]
    OpponentBest,
    /// `max(my_first_bid / boundary_ratio, opponent_best)`.
    MinimumOffer,
}

/// Parameters of a concession scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcessionConfig {
    /// Decay shape.
    pub curve: ConcessionCurve,
    /// Base of the square-root curve. Ignored by the quadratic curve.
    pub curve_base: CurveBase,
    /// The target never falls below `best / boundary_ratio`.
    pub boundary_ratio: f64,
    /// Discount factors below this switch to the discount-aware rule.
    pub discount_threshold: f64,
    /// The discount-aware rule concedes by `max(0, pivot - discount)`.
    pub discount_pivot: f64,
    /// In the last `final_window` fraction of time the target is the minimum offer.
    pub final_window: f64,
}

impl Default for ConcessionConfig {
    fn default() -> Self {
        Self {
            curve: ConcessionCurve::Quadratic,
            curve_base: CurveBase::OpponentBest,
            boundary_ratio: 1.4,
            discount_threshold: 0.7,
            discount_pivot: 0.45,
            final_window: 0.0,
        }
    }
}

impl ConcessionConfig {
    /// Creates the offering defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the acceptance defaults: a tighter floor and a 2% final window.
    #[must_use]
    pub fn for_acceptance() -> Self {
        Self {
            boundary_ratio: 1.2,
            final_window: 0.02,
            ..Self::default()
        }
    }

    /// Sets the decay shape.
    #[must_use]
    pub const fn with_curve(mut self, curve: ConcessionCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Sets the square-root curve base.
    #[must_use]
    pub const fn with_curve_base(mut self, base: CurveBase) -> Self {
        self.curve_base = base;
        self
    }

    /// Sets the boundary ratio.
    #[must_use]
    pub const fn with_boundary_ratio(mut self, ratio: f64) -> Self {
        self.boundary_ratio = ratio;
        self
    }

    /// Sets the discount activation threshold.
    #[must_use]
    pub const fn with_discount_threshold(mut self, threshold: f64) -> Self {
        self.discount_threshold = threshold;
        self
    }

    /// Sets the discount pivot.
    #[must_use]
    pub const fn with_discount_pivot(mut self, pivot: f64) -> Self {
        self.discount_pivot = pivot;
        self
    }

    /// Sets the final window.
    #[must_use]
    pub const fn with_final_window(mut self, window: f64) -> Self {
        self.final_window = window;
        self
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] for a boundary ratio below
    /// 1 or a threshold, pivot or window outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !self.boundary_ratio.is_finite() || self.boundary_ratio < 1.0 {
            return Err(NegotiationError::invalid_config(format!(
                "boundary ratio must be at least 1, got {}",
                self.boundary_ratio
            )));
        }
        check_unit("discount threshold", self.discount_threshold)?;
        check_unit("discount pivot", self.discount_pivot)?;
        check_unit("final window", self.final_window)
    }
}

/// Weights γ of the opponent's first, best and last bids in the rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceWeights {
    /// Weight of the opponent's first bid.
    pub first: f64,
    /// Weight of the opponent's best bid (for us).
    pub best: f64,
    /// Weight of the opponent's most recent bid.
    pub last: f64,
}

impl Default for ReferenceWeights {
    fn default() -> Self {
        Self {
            first: 1.0,
            best: 0.8,
            last: 0.3,
        }
    }
}

impl ReferenceWeights {
    /// Creates reference weights.
    #[must_use]
    pub const fn new(first: f64, best: f64, last: f64) -> Self {
        Self { first, best, last }
    }

    /// Returns `[first, best, last]`.
    #[must_use]
    pub const fn as_array(&self) -> [f64; 3] {
        [self.first, self.best, self.last]
    }

    /// Validates the weights.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] for a negative or
    /// non-finite weight.
    pub fn validate(&self) -> Result<()> {
        if self.as_array().iter().any(|g| !g.is_finite() || *g < 0.0) {
            return Err(NegotiationError::invalid_config(
                "reference weights must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Parameters of the opponent frequency model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentModelConfig {
    /// Score added to a value each time the opponent picks it.
    pub learn_increment: f64,
    /// Re-derive and renormalize issue weights after every update.
    pub renormalize_issue_weights: bool,
}

impl Default for OpponentModelConfig {
    fn default() -> Self {
        Self {
            learn_increment: 1.0,
            renormalize_issue_weights: true,
        }
    }
}

impl OpponentModelConfig {
    /// Sets the learn increment.
    #[must_use]
    pub const fn with_learn_increment(mut self, increment: f64) -> Self {
        self.learn_increment = increment;
        self
    }

    /// Enables or disables issue-weight renormalization.
    #[must_use]
    pub const fn with_renormalization(mut self, enabled: bool) -> Self {
        self.renormalize_issue_weights = enabled;
        self
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] unless the learn increment
    /// is finite and positive.
    pub fn validate(&self) -> Result<()> {
        let increment = self.learn_increment;
        if !increment.is_finite() || increment <= 0.0 {
            return Err(NegotiationError::invalid_config(format!(
                "learn increment must be positive, got {increment}"
            )));
        }
        Ok(())
    }
}

/// How the next bid is picked among the bids above the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BidPicking {
    /// Rate every candidate against the reference bids and sample by rating.
    #[default]
    RatedSample,
    /// Offer the bid whose utility is closest to the target.
    NearestUtility,
}

/// Parameters of the offering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OfferingConfig {
    /// Bid picking mode.
    pub picking: BidPicking,
    /// When less than this much time is left, offer the opponent's best bid.
    pub endgame_margin: Option<f64>,
}

/// Complete configuration of one negotiating agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Scheduler used for the offering floor.
    pub offer_concession: ConcessionConfig,
    /// Scheduler used for the acceptance threshold.
    pub accept_concession: ConcessionConfig,
    /// Reference-bid weights γ.
    pub reference_weights: ReferenceWeights,
    /// Sampling bias in `(0, 1]`; lower favors high ratings more.
    pub bias: f64,
    /// Opponent model parameters.
    pub opponent_model: OpponentModelConfig,
    /// Offering parameters.
    pub offering: OfferingConfig,
    /// Seed of the session random source; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Largest domain the reference outcome space will enumerate.
    pub max_outcomes: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            offer_concession: ConcessionConfig::default(),
            accept_concession: ConcessionConfig::for_acceptance(),
            reference_weights: ReferenceWeights::default(),
            bias: 0.25,
            opponent_model: OpponentModelConfig::default(),
            offering: OfferingConfig::default(),
            seed: None,
            max_outcomes: 100_000,
        }
    }
}

impl AgentConfig {
    /// Creates the default (quadratic concession, rated sampling) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Square-root concession for offering and acceptance, nearest-utility
    /// picking, and the opponent's best bid in the last 5 time units.
    #[must_use]
    pub fn square_root() -> Self {
        Self {
            offer_concession: ConcessionConfig::default().with_curve(ConcessionCurve::SquareRoot),
            accept_concession: ConcessionConfig::for_acceptance()
                .with_curve(ConcessionCurve::SquareRoot)
                .with_curve_base(CurveBase::MinimumOffer),
            offering: OfferingConfig {
                picking: BidPicking::NearestUtility,
                endgame_margin: Some(5.0),
            },
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] if parsing or validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| NegotiationError::invalid_config(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the offering scheduler.
    #[must_use]
    pub const fn with_offer_concession(mut self, config: ConcessionConfig) -> Self {
        self.offer_concession = config;
        self
    }

    /// Sets the acceptance scheduler.
    #[must_use]
    pub const fn with_accept_concession(mut self, config: ConcessionConfig) -> Self {
        self.accept_concession = config;
        self
    }

    /// Sets the reference-bid weights.
    #[must_use]
    pub const fn with_reference_weights(mut self, weights: ReferenceWeights) -> Self {
        self.reference_weights = weights;
        self
    }

    /// Sets the sampling bias.
    #[must_use]
    pub const fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Sets the opponent model parameters.
    #[must_use]
    pub const fn with_opponent_model(mut self, config: OpponentModelConfig) -> Self {
        self.opponent_model = config;
        self
    }

    /// Sets the bid picking mode.
    #[must_use]
    pub const fn with_picking(mut self, picking: BidPicking) -> Self {
        self.offering.picking = picking;
        self
    }

    /// Sets the endgame margin.
    #[must_use]
    pub const fn with_endgame_margin(mut self, margin: Option<f64>) -> Self {
        self.offering.endgame_margin = margin;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the outcome enumeration limit.
    #[must_use]
    pub const fn with_max_outcomes(mut self, max: usize) -> Self {
        self.max_outcomes = max;
        self
    }

    /// Validates the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] naming the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.offer_concession.validate()?;
        self.accept_concession.validate()?;
        self.reference_weights.validate()?;

        if !self.bias.is_finite() || self.bias <= 0.0 || self.bias > 1.0 {
            return Err(NegotiationError::invalid_config(format!(
                "bias must be in (0, 1], got {}",
                self.bias
            )));
        }
        self.opponent_model.validate()?;
        if let Some(margin) = self.offering.endgame_margin {
            if !margin.is_finite() || margin < 0.0 {
                return Err(NegotiationError::invalid_config(format!(
                    "endgame margin must be non-negative, got {margin}"
                )));
            }
        }
        if self.max_outcomes == 0 {
            return Err(NegotiationError::invalid_config("max outcomes must be positive"));
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(NegotiationError::invalid_config(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}
