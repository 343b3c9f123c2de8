//! Offering strategy: what to bid next.
//!
//! Each round the opponent model learns from the latest opponent bid, the
//! offering scheduler sets a utility floor, and one bid is picked among all
//! bids between that floor and the best achievable utility.

use rand::RngCore;
use tracing::debug;

use crate::concession::{ConcessionInput, ConcessionScheduler};
use crate::config::{AgentConfig, BidPicking};
use crate::error::{NegotiationError, Result};
use crate::history::{BidHistory, BidRecord};
use crate::opponent::OpponentModel;
use crate::outcome::OutcomeSpace;
use crate::rating::ReferenceBids;
use crate::selector::{BidSelector, RatingSelector, SelectionContext, StochasticBidSelector};
use crate::utility::UtilityFunction;

/// What an offering strategy sees in one round.
#[derive(Clone, Copy)]
pub struct OfferContext<'a> {
    /// All bids of the domain, evaluated to self.
    pub space: &'a dyn OutcomeSpace,
    /// Our own preferences.
    pub preferences: &'a dyn UtilityFunction,
    /// Bids received from the opponent.
    pub opponent: &'a BidHistory,
    /// Bids we have offered.
    pub own: &'a BidHistory,
    /// Time elapsed.
    pub current_time: f64,
    /// Time budget.
    pub total_time: f64,
    /// Time-discount multiplier.
    pub discount_factor: f64,
}

/// Produces our bids.
pub trait OfferingStrategy {
    /// The bid to open with.
    ///
    /// # Errors
    ///
    /// Returns error if the outcome space is empty.
    fn opening_bid(&mut self, space: &dyn OutcomeSpace) -> Result<BidRecord>;

    /// The bid to offer in response to the opponent.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] before the opponent has bid,
    /// or the error of the scheduler, the model or the selector.
    fn next_bid(&mut self, context: &OfferContext<'_>, rng: &mut dyn RngCore) -> Result<BidRecord>;
}

/// Concedes over time and prefers bids resembling the opponent's.
#[derive(Debug, Clone)]
pub struct ConcessionOfferer<M> {
    scheduler: ConcessionScheduler,
    selector: RatingSelector,
    picking: BidPicking,
    endgame_margin: Option<f64>,
    model: M,
}

impl<M: OpponentModel> ConcessionOfferer<M> {
    /// Creates an offerer from the agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: &AgentConfig, model: M) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scheduler: ConcessionScheduler::new(config.offer_concession)?,
            selector: RatingSelector::new(
                config.reference_weights,
                StochasticBidSelector::new(config.bias)?,
            ),
            picking: config.offering.picking,
            endgame_margin: config.offering.endgame_margin,
            model,
        })
    }

    /// Returns the opponent model.
    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Lets the opponent model learn from the opponent's history.
    ///
    /// # Errors
    ///
    /// Returns the model's error.
    pub fn observe(&mut self, opponent: &BidHistory) -> Result<()> {
        self.model.update(opponent)
    }

    /// The utility floor for the next bid.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] before the opponent has bid,
    /// or the scheduler's error.
    pub fn target_utility(&self, context: &OfferContext<'_>) -> Result<f64> {
        let max = context.space.max_bid()?;
        let opponent_best = context
            .opponent
            .best()
            .ok_or_else(|| NegotiationError::invalid_input("opponent has not bid"))?;

        let mut input = ConcessionInput::new(
            context.current_time,
            context.total_time,
            max.utility,
            opponent_best.utility,
        )
        .with_discount_factor(context.discount_factor);
        if let Some(first) = context.own.first() {
            input = input.with_my_first_bid_utility(first.utility);
        }
        self.scheduler.target_utility(&input)
    }

    fn in_endgame(&self, context: &OfferContext<'_>) -> bool {
        self.endgame_margin
            .is_some_and(|margin| context.total_time - context.current_time < margin)
    }
}

impl<M: OpponentModel> OfferingStrategy for ConcessionOfferer<M> {
    fn opening_bid(&mut self, space: &dyn OutcomeSpace) -> Result<BidRecord> {
        space.max_bid()
    }

    fn next_bid(&mut self, context: &OfferContext<'_>, rng: &mut dyn RngCore) -> Result<BidRecord> {
        self.model.update(context.opponent)?;

        if self.in_endgame(context) {
            if let Some(best) = context.opponent.best() {
                debug!(utility = best.utility, "endgame: offering opponent's best bid");
                return Ok(best.clone());
            }
        }

        let target = self.target_utility(context)?;
        let max = context.space.max_bid()?;
        let candidates = context.space.bids_in_range(target, max.utility);

        let chosen = match self.picking {
            BidPicking::NearestUtility => context.space.bid_near_utility(target)?,
            BidPicking::RatedSample if candidates.is_empty() => context.space.bid_near_utility(target)?,
            BidPicking::RatedSample => {
                let selection = SelectionContext {
                    references: ReferenceBids::from_history(context.opponent)?,
                    issue_weights: self.model.issue_weights(),
                    scorer: context.preferences,
                };
                self.selector.select_bid(&candidates, &selection, rng)?.clone()
            }
        };

        debug!(
            target,
            candidates = candidates.len(),
            utility = chosen.utility,
            "next bid chosen"
        );
        Ok(chosen)
    }
}
