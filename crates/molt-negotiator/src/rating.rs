//! Similarity rating of candidate bids against the opponent's bids.
//!
//! A candidate is rated by its weighted Euclidean distance to three
//! reference bids (the opponent's first, best-for-us and last offers):
//!
//! ```text
//! distance(r) = sqrt( Σ_i ( ω_i · (score_i(candidate) − score_i(r)) )² )
//! rating      = − Σ_r γ_r · distance(r)
//! ```
//!
//! `score_i` is our own evaluation of the value chosen for issue `i` and `ω`
//! the opponent model's issue weights. Ratings are non-positive; 0 means the
//! candidate is indistinguishable from every reference bid.

use crate::config::ReferenceWeights;
use crate::domain::Bid;
use crate::error::{NegotiationError, Result};
use crate::history::BidHistory;
use crate::utility::UtilityFunction;

/// The opponent bids a candidate is compared against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceBids<'a> {
    /// The opponent's first bid.
    pub first: &'a Bid,
    /// The opponent's best bid for us.
    pub best: &'a Bid,
    /// The opponent's most recent bid.
    pub last: &'a Bid,
}

impl<'a> ReferenceBids<'a> {
    /// Creates reference bids.
    #[must_use]
    pub const fn new(first: &'a Bid, best: &'a Bid, last: &'a Bid) -> Self {
        Self { first, best, last }
    }

    /// Takes first, best and last from the opponent's history.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] if the history is empty.
    pub fn from_history(history: &'a BidHistory) -> Result<Self> {
        match (history.first(), history.best(), history.last()) {
            (Some(first), Some(best), Some(last)) => Ok(Self::new(&first.bid, &best.bid, &last.bid)),
            _ => Err(NegotiationError::invalid_input(
                "no reference bids before the opponent has bid",
            )),
        }
    }

    /// Returns `[first, best, last]`.
    #[must_use]
    pub const fn as_array(&self) -> [&'a Bid; 3] {
        [self.first, self.best, self.last]
    }
}

/// Rates a candidate against the reference bids.
///
/// # Errors
///
/// Returns [`NegotiationError::PreconditionViolation`] if the weight vector,
/// the candidate and the reference bids do not all cover the same issues.
pub fn rate(
    candidate: &Bid,
    references: &ReferenceBids<'_>,
    issue_weights: &[f64],
    gamma: &ReferenceWeights,
    scorer: &dyn UtilityFunction,
) -> Result<f64> {
    if candidate.len() != issue_weights.len() {
        return Err(NegotiationError::precondition(format!(
            "candidate covers {} issues, weight vector has {}",
            candidate.len(),
            issue_weights.len()
        )));
    }

    let candidate_scores = value_scores(candidate, scorer);
    let mut weighted = 0.0;
    for (reference, g) in references.as_array().into_iter().zip(gamma.as_array()) {
        if reference.len() != candidate.len() {
            return Err(NegotiationError::precondition(format!(
                "reference bid covers {} issues, candidate {}",
                reference.len(),
                candidate.len()
            )));
        }
        let reference_scores = value_scores(reference, scorer);
        weighted += g * weighted_distance(issue_weights, &candidate_scores, &reference_scores);
    }

    Ok(-weighted)
}

/// Rates many candidates at once.
///
/// # Errors
///
/// See [`rate`].
pub fn rate_all(
    candidates: &[Bid],
    references: &ReferenceBids<'_>,
    issue_weights: &[f64],
    gamma: &ReferenceWeights,
    scorer: &dyn UtilityFunction,
) -> Result<Vec<f64>> {
    candidates
        .iter()
        .map(|candidate| rate(candidate, references, issue_weights, gamma, scorer))
        .collect()
}

fn value_scores(bid: &Bid, scorer: &dyn UtilityFunction) -> Vec<f64> {
    bid.iter()
        .map(|(issue, value)| scorer.value_score(issue, value))
        .collect()
}

/// `sqrt( Σ (ω_i · (a_i − b_i))² )`
fn weighted_distance(omega: &[f64], a: &[f64], b: &[f64]) -> f64 {
    omega
        .iter()
        .zip(a.iter().zip(b))
        .map(|(w, (x, y))| (w * (x - y)).powi(2))
        .sum::<f64>()
        .sqrt()
}
