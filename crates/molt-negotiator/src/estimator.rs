//! Ranking-based estimate of the agent's own utility function.
//!
//! Used when the agent only knows an ordinal ranking of some bids instead of
//! its full utility function. The estimate is closed-form and computed once
//! per session:
//!
//! 1. Each rank position gets a pseudo-utility, linearly spaced from 0 (worst)
//!    to 1 (best). Accumulating these per `(issue, value)` and dividing each
//!    issue by its maximum gives the value weights.
//! 2. The same accumulation with pseudo-utilities spaced from -1 to 1 rewards
//!    values endorsed consistently at one end of the ranking. The maximum per
//!    issue, normalized to sum 1, gives the issue weights.
//!
//! Estimated utility is `Σ issue_weight × value_weight[bid value]`.
//!
//! The closed form can score the best-ranked bid below the worst-ranked one.
//! Such an estimate is rejected rather than returned.

use tracing::debug;

use crate::domain::{Bid, Domain, IssueId, ValueId};
use crate::error::{NegotiationError, Result};
use crate::utility::UtilityFunction;

/// Utility estimate derived from a worst-to-best bid ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEstimator {
    issue_weights: Vec<f64>,
    value_weights: Vec<Vec<f64>>,
}

impl RankingEstimator {
    /// Builds the estimate from bids ordered worst to best.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] if the ranking is empty or
    /// contains a bid that does not fit the domain, and
    /// [`NegotiationError::DegenerateState`] if no issue receives positive
    /// weight (for example a ranking of identical bids) or if the estimate
    /// scores the best-ranked bid below the worst-ranked one.
    pub fn from_ranking(domain: &Domain, ranking: &[Bid]) -> Result<Self> {
        if ranking.is_empty() {
            return Err(NegotiationError::invalid_input("bid ranking is empty"));
        }
        for (rank, bid) in ranking.iter().enumerate() {
            domain.check_bid(bid).map_err(|e| {
                NegotiationError::invalid_input(format!("malformed bid at rank {rank}: {e}"))
            })?;
        }

        let counts = domain.value_counts();

        let mut value_weights =
            weighted_frequency(&counts, ranking, &linspace(0.0, 1.0, ranking.len()));
        for (issue, row) in value_weights.iter_mut().enumerate() {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max <= 0.0 {
                return Err(NegotiationError::degenerate(format!(
                    "issue {issue} has no positively ranked value"
                )));
            }
            for weight in row.iter_mut() {
                *weight /= max;
            }
        }

        let endorsement = weighted_frequency(&counts, ranking, &linspace(-1.0, 1.0, ranking.len()));
        let mut issue_weights: Vec<f64> = endorsement
            .iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(0.0))
            .collect();
        let total: f64 = issue_weights.iter().sum();
        if total <= 0.0 {
            return Err(NegotiationError::degenerate(
                "ranking gives no issue a positive weight",
            ));
        }
        for weight in &mut issue_weights {
            *weight /= total;
        }

        let estimator = Self {
            issue_weights,
            value_weights,
        };
        if let (Some(worst), Some(best)) = (ranking.first(), ranking.last()) {
            let (worst, best) = (estimator.utility(worst), estimator.utility(best));
            if best < worst {
                return Err(NegotiationError::degenerate(format!(
                    "estimate inverts the ranking: best bid scores {best}, worst bid {worst}"
                )));
            }
        }

        debug!(
            ranked_bids = ranking.len(),
            issues = estimator.issue_weights.len(),
            "estimated utility function from ranking"
        );
        Ok(estimator)
    }

    /// Returns the estimated issue weights (sum to 1).
    #[must_use]
    pub fn issue_weights(&self) -> &[f64] {
        &self.issue_weights
    }

    /// Returns the estimated weight of a value, in `[0, 1]`.
    #[must_use]
    pub fn value_weight(&self, issue: IssueId, value: ValueId) -> f64 {
        self.value_weights
            .get(issue.index())
            .and_then(|row| row.get(value.index()))
            .copied()
            .unwrap_or(0.0)
    }
}

impl UtilityFunction for RankingEstimator {
    fn utility(&self, bid: &Bid) -> f64 {
        bid.iter()
            .map(|(issue, value)| {
                self.issue_weights.get(issue.index()).copied().unwrap_or(0.0)
                    * self.value_weight(issue, value)
            })
            .sum()
    }

    fn value_score(&self, issue: IssueId, value: ValueId) -> f64 {
        self.value_weight(issue, value)
    }
}

/// `n` evenly spaced points from `start` to `end` inclusive.
///
/// A single point sits at `end`: a one-bid ranking is its own best bid.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![end],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Sums each rank's pseudo-utility into the `(issue, value)` cell it chose.
fn weighted_frequency(counts: &[usize], ranking: &[Bid], pseudo: &[f64]) -> Vec<Vec<f64>> {
    let mut table: Vec<Vec<f64>> = counts.iter().map(|&n| vec![0.0; n]).collect();
    for (bid, u) in ranking.iter().zip(pseudo) {
        for (issue, value) in bid.iter() {
            table[issue.index()][value.index()] += u;
        }
    }
    table
}
