//! Acceptance decision.
//!
//! # Rule
//!
//! The opponent's last offer is accepted when
//!
//! 1. it is at least as good as the bid we were about to propose *and* at
//!    least as good as anything else the opponent has offered, or
//! 2. it clears the current concession threshold.
//!
//! Everything else is rejected. The rule is fixed; variants only change how
//! the four input quantities are derived.
//!
//! # Rounds
//!
//! ```text
//!  next_round()
//!      │
//!      ▼
//!  ┌──────────┐  decide()  ┌─────────┐
//!  │ Deciding │ ─────────► │ Decided │
//!  └──────────┘            └─────────┘
//!      ▲                        │
//!      └──────── next_round() ──┘
//! ```
//!
//! One decision per round: deciding again before `next_round()` is a
//! precondition violation.

use serde::Serialize;
use tracing::debug;

use crate::concession::{ConcessionInput, ConcessionScheduler, NOMINAL_MAX_UTILITY};
use crate::config::ConcessionConfig;
use crate::error::{NegotiationError, Result};
use crate::history::BidHistory;

/// Outcome of an acceptance decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Take the opponent's last offer.
    Accept,
    /// Keep negotiating.
    Reject,
}

impl Decision {
    /// Returns true for [`Decision::Accept`].
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// The four quantities the acceptance rule compares, all as utility to self.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceInput {
    /// Utility of the opponent's most recent offer.
    pub opponent_last: f64,
    /// Utility of the opponent's best offer so far.
    pub opponent_best: f64,
    /// Utility of the bid we would offer next.
    pub my_next: f64,
    /// Current concession threshold.
    pub threshold: f64,
}

impl AcceptanceInput {
    /// Creates an acceptance input.
    #[must_use]
    pub const fn new(opponent_last: f64, opponent_best: f64, my_next: f64, threshold: f64) -> Self {
        Self {
            opponent_last,
            opponent_best,
            my_next,
            threshold,
        }
    }
}

/// Applies the acceptance rule.
///
/// # Errors
///
/// Returns [`NegotiationError::InvalidInput`] if any quantity is not finite.
pub fn decide(input: &AcceptanceInput) -> Result<Decision> {
    let values = [
        input.opponent_last,
        input.opponent_best,
        input.my_next,
        input.threshold,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(NegotiationError::invalid_input(format!(
            "acceptance inputs must be finite: {input:?}"
        )));
    }

    let last = input.opponent_last;
    if last >= input.my_next && last >= input.opponent_best {
        return Ok(Decision::Accept);
    }
    if last >= input.threshold {
        return Ok(Decision::Accept);
    }
    Ok(Decision::Reject)
}

/// State of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundState {
    /// No decision made yet.
    #[default]
    Deciding,
    /// The round's decision.
    Decided(Decision),
}

/// Enforces one acceptance decision per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcceptanceRound {
    state: RoundState,
}

impl AcceptanceRound {
    /// Creates a round in the deciding state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> RoundState {
        self.state
    }

    /// Returns this round's decision, if made.
    #[must_use]
    pub const fn decision(&self) -> Option<Decision> {
        match self.state {
            RoundState::Deciding => None,
            RoundState::Decided(decision) => Some(decision),
        }
    }

    /// Decides this round.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::PreconditionViolation`] if the round is
    /// already decided, or the error of [`decide`]. A failed decision leaves
    /// the round deciding.
    pub fn decide(&mut self, input: &AcceptanceInput) -> Result<Decision> {
        if let RoundState::Decided(previous) = self.state {
            return Err(NegotiationError::precondition(format!(
                "round already decided: {previous:?}"
            )));
        }
        let decision = decide(input)?;
        self.state = RoundState::Decided(decision);
        Ok(decision)
    }

    /// Re-enters the deciding state for a new round.
    pub fn next_round(&mut self) {
        self.state = RoundState::Deciding;
    }
}

/// What an acceptance strategy sees in one round.
#[derive(Debug, Clone, Copy)]
pub struct AcceptanceContext<'a> {
    /// Bids received from the opponent.
    pub opponent: &'a BidHistory,
    /// Bids we have offered.
    pub own: &'a BidHistory,
    /// Utility of the bid we would offer next.
    pub my_next_utility: f64,
    /// Time elapsed.
    pub current_time: f64,
    /// Time budget.
    pub total_time: f64,
    /// Time-discount multiplier.
    pub discount_factor: f64,
}

/// Decides whether to take the opponent's last offer.
pub trait AcceptanceStrategy {
    /// Decides the current round.
    ///
    /// # Errors
    ///
    /// Returns error if the round is already decided or the inputs are invalid.
    fn decide(&mut self, context: &AcceptanceContext<'_>) -> Result<Decision>;

    /// Starts a new round.
    fn next_round(&mut self);
}

/// Accepts offers above a time-dependent concession threshold.
///
/// The threshold comes from a [`ConcessionScheduler`] whose ceiling is the
/// utility of our own first bid.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdAcceptance {
    scheduler: ConcessionScheduler,
    round: AcceptanceRound,
}

impl ThresholdAcceptance {
    /// Creates the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] if the config is invalid.
    pub fn new(config: ConcessionConfig) -> Result<Self> {
        Ok(Self {
            scheduler: ConcessionScheduler::new(config)?,
            round: AcceptanceRound::new(),
        })
    }

    /// Returns the state of the current round.
    #[must_use]
    pub const fn round(&self) -> &AcceptanceRound {
        &self.round
    }

    /// Computes the acceptance threshold for the context.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] if the opponent has not bid,
    /// or the scheduler's error.
    pub fn threshold(&self, context: &AcceptanceContext<'_>) -> Result<f64> {
        let opponent_best = context
            .opponent
            .best()
            .ok_or_else(|| NegotiationError::invalid_input("opponent has not bid"))?;

        let my_first = context.own.first().map(|r| r.utility);
        let mut input = ConcessionInput::new(
            context.current_time,
            context.total_time,
            my_first.unwrap_or(NOMINAL_MAX_UTILITY),
            opponent_best.utility,
        )
        .with_discount_factor(context.discount_factor);
        if let Some(utility) = my_first {
            input = input.with_my_first_bid_utility(utility);
        }
        self.scheduler.target_utility(&input)
    }
}

impl AcceptanceStrategy for ThresholdAcceptance {
    fn decide(&mut self, context: &AcceptanceContext<'_>) -> Result<Decision> {
        let (Some(last), Some(best)) = (context.opponent.last(), context.opponent.best()) else {
            return Err(NegotiationError::invalid_input("no opponent offer to accept"));
        };
        let threshold = self.threshold(context)?;
        let input = AcceptanceInput::new(last.utility, best.utility, context.my_next_utility, threshold);
        let decision = self.round.decide(&input)?;

        debug!(
            opponent_last = last.utility,
            opponent_best = best.utility,
            my_next = context.my_next_utility,
            threshold,
            decision = ?decision,
            "acceptance decided"
        );
        Ok(decision)
    }

    fn next_round(&mut self) {
        self.round.next_round();
    }
}
