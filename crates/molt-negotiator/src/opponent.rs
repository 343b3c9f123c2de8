//! Frequency-based opponent preference model.
//!
//! Values the opponent keeps choosing are assumed to matter to it: every
//! observed bid adds `learn_increment` to the score of the value it picked
//! for each issue. Issues whose dominant value is repeated most get the
//! highest weight.
//!
//! Scores live in dense `issue × value` tables sized from the domain, so the
//! key set is fixed at construction and scores only ever grow.

use tracing::debug;

use crate::config::OpponentModelConfig;
use crate::domain::{Bid, Domain, IssueId, ValueId};
use crate::error::{NegotiationError, Result};
use crate::history::BidHistory;

/// Learned estimate of the opponent's preferences.
pub trait OpponentModel {
    /// Learns from the most recent bid of the opponent's history.
    ///
    /// Calling this again before the opponent bids again is a no-op, and so
    /// is calling it on an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::PreconditionViolation`] if the bid does not
    /// fit the domain the model was built for.
    fn update(&mut self, history: &BidHistory) -> Result<()>;

    /// Normalized importance of a value within its issue, in `[0, 1]`.
    fn weight_of(&self, issue: IssueId, value: ValueId) -> f64;

    /// Issue weights, one per issue, summing to 1.
    fn issue_weights(&self) -> &[f64];

    /// Number of opponent bids learned from.
    fn observations(&self) -> usize;
}

/// Counts how often the opponent chooses each value.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyModel {
    config: OpponentModelConfig,
    scores: Vec<Vec<f64>>,
    issue_weights: Vec<f64>,
    observed: usize,
}

impl FrequencyModel {
    /// Creates an uninformed model: every value scores 1, issues are uniform.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] for a learn increment that
    /// is not finite and positive.
    pub fn new(domain: &Domain, config: OpponentModelConfig) -> Result<Self> {
        config.validate()?;
        let issues = domain.issue_count();
        Ok(Self {
            config,
            scores: domain
                .value_counts()
                .into_iter()
                .map(|n| vec![1.0; n])
                .collect(),
            issue_weights: vec![1.0 / issues as f64; issues],
            observed: 0,
        })
    }

    /// Raw frequency score of a value (1 plus the increments it received).
    #[must_use]
    pub fn value_score(&self, issue: IssueId, value: ValueId) -> f64 {
        self.scores
            .get(issue.index())
            .and_then(|row| row.get(value.index()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Learns from one opponent bid.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::PreconditionViolation`] if the bid does not
    /// fit the domain; the model is left unchanged.
    pub fn observe(&mut self, bid: &Bid) -> Result<()> {
        self.check(bid)?;

        for (issue, value) in bid.iter() {
            self.scores[issue.index()][value.index()] += self.config.learn_increment;
        }
        self.observed += 1;

        if self.config.renormalize_issue_weights {
            self.renormalize();
        }

        debug!(
            observations = self.observed,
            issue_weights = ?self.issue_weights,
            "opponent model updated"
        );
        Ok(())
    }

    fn check(&self, bid: &Bid) -> Result<()> {
        if bid.len() != self.scores.len() {
            return Err(NegotiationError::precondition(format!(
                "bid covers {} issues, model knows {}",
                bid.len(),
                self.scores.len()
            )));
        }
        for (issue, value) in bid.iter() {
            if value.index() >= self.scores[issue.index()].len() {
                return Err(NegotiationError::precondition(format!(
                    "{value} is not a known value of {issue}"
                )));
            }
        }
        Ok(())
    }

    fn renormalize(&mut self) {
        let raw: Vec<f64> = self.scores.iter().map(|row| row_max(row)).collect();
        let total: f64 = raw.iter().sum();
        if total > 0.0 {
            self.issue_weights = raw.into_iter().map(|w| w / total).collect();
        }
    }
}

impl OpponentModel for FrequencyModel {
    fn update(&mut self, history: &BidHistory) -> Result<()> {
        if history.len() <= self.observed {
            return Ok(());
        }
        match history.last() {
            Some(record) => self.observe(&record.bid),
            None => Ok(()),
        }
    }

    fn weight_of(&self, issue: IssueId, value: ValueId) -> f64 {
        let Some(row) = self.scores.get(issue.index()) else {
            return 0.0;
        };
        let max = row_max(row);
        row.get(value.index()).map_or(0.0, |score| score / max)
    }

    fn issue_weights(&self) -> &[f64] {
        &self.issue_weights
    }

    fn observations(&self) -> usize {
        self.observed
    }
}

fn row_max(row: &[f64]) -> f64 {
    row.iter().copied().fold(0.0, f64::max)
}
