//! The agent's own valuation of bids.
//!
//! - [`UtilityFunction`]: the read-only query every component uses
//! - [`AdditiveUtility`]: a fully specified linear-additive utility
//! - [`Preferences`]: known utility or a ranking-derived estimate

use serde::Serialize;

use crate::domain::{Bid, Domain, IssueId, ValueId};
use crate::error::{NegotiationError, Result};
use crate::estimator::RankingEstimator;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Utility-to-self of bids over a fixed domain.
pub trait UtilityFunction {
    /// Utility of a complete bid, in `[0, 1]`.
    fn utility(&self, bid: &Bid) -> f64;

    /// Evaluation of a single value of an issue, in `[0, 1]`.
    ///
    /// Unknown issues or values evaluate to `0.0`; callers validate bids
    /// against the domain first.
    fn value_score(&self, issue: IssueId, value: ValueId) -> f64;
}

/// A linear-additive utility: `Σ issue_weight × evaluation(value)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdditiveUtility {
    issue_weights: Vec<f64>,
    evaluations: Vec<Vec<f64>>,
}

impl AdditiveUtility {
    /// Creates an additive utility.
    ///
    /// `evaluations[i][v]` is the evaluation of value `v` of issue `i`.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] if the tables do not match
    /// the domain shape, a weight is negative, the weights do not sum to 1,
    /// or an evaluation lies outside `[0, 1]`.
    pub fn new(domain: &Domain, issue_weights: Vec<f64>, evaluations: Vec<Vec<f64>>) -> Result<Self> {
        let counts = domain.value_counts();
        if issue_weights.len() != counts.len() || evaluations.len() != counts.len() {
            return Err(NegotiationError::invalid_input(format!(
                "utility tables cover {} weights and {} evaluation rows, domain has {} issues",
                issue_weights.len(),
                evaluations.len(),
                counts.len()
            )));
        }

        if issue_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(NegotiationError::invalid_input(
                "issue weights must be finite and non-negative",
            ));
        }
        let sum: f64 = issue_weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(NegotiationError::invalid_input(format!(
                "issue weights sum to {sum}, expected 1"
            )));
        }

        for (i, (row, count)) in evaluations.iter().zip(&counts).enumerate() {
            if row.len() != *count {
                return Err(NegotiationError::invalid_input(format!(
                    "issue {i} has {count} values but {} evaluations",
                    row.len()
                )));
            }
            if row.iter().any(|e| !(0.0..=1.0).contains(e)) {
                return Err(NegotiationError::invalid_input(format!(
                    "evaluations of issue {i} must lie in [0, 1]"
                )));
            }
        }

        Ok(Self {
            issue_weights,
            evaluations,
        })
    }

    /// Returns the issue weights.
    #[must_use]
    pub fn issue_weights(&self) -> &[f64] {
        &self.issue_weights
    }
}

impl UtilityFunction for AdditiveUtility {
    fn utility(&self, bid: &Bid) -> f64 {
        bid.iter()
            .map(|(issue, value)| {
                self.issue_weights.get(issue.index()).copied().unwrap_or(0.0)
                    * self.value_score(issue, value)
            })
            .sum()
    }

    fn value_score(&self, issue: IssueId, value: ValueId) -> f64 {
        self.evaluations
            .get(issue.index())
            .and_then(|row| row.get(value.index()))
            .copied()
            .unwrap_or(0.0)
    }
}

/// What the agent knows about its own preferences.
#[derive(Debug, Clone)]
pub enum Preferences {
    /// The full utility function is known.
    Known(AdditiveUtility),
    /// Only an ordinal ranking was supplied; utilities are estimated.
    Ranked(RankingEstimator),
}

impl Preferences {
    /// Returns true when utilities are estimated from a ranking.
    #[must_use]
    pub const fn is_uncertain(&self) -> bool {
        matches!(self, Self::Ranked(_))
    }
}

impl UtilityFunction for Preferences {
    fn utility(&self, bid: &Bid) -> f64 {
        match self {
            Self::Known(utility) => utility.utility(bid),
            Self::Ranked(estimator) => estimator.utility(bid),
        }
    }

    fn value_score(&self, issue: IssueId, value: ValueId) -> f64 {
        match self {
            Self::Known(utility) => utility.value_score(issue, value),
            Self::Ranked(estimator) => estimator.value_score(issue, value),
        }
    }
}
