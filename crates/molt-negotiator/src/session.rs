//! One negotiating agent in one bilateral session.
//!
//! The session owns every component outright: domain, preferences, the
//! outcome space, both histories, the opponent model (inside the offerer),
//! the acceptance strategy and the random source. Nothing is shared between
//! sessions.

use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::acceptance::{AcceptanceContext, AcceptanceStrategy, ThresholdAcceptance};
use crate::config::AgentConfig;
use crate::domain::{Bid, Domain};
use crate::error::{NegotiationError, Result};
use crate::history::{BidHistory, BidRecord};
use crate::offering::{ConcessionOfferer, OfferContext, OfferingStrategy};
use crate::opponent::FrequencyModel;
use crate::outcome::SortedOutcomeSpace;
use crate::timeline::{Timeline, elapsed_fraction};
use crate::utility::{Preferences, UtilityFunction};

/// Unique identifier for a negotiation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The agent's move in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "bid", rename_all = "snake_case")]
pub enum Action {
    /// Propose a bid.
    Offer(Bid),
    /// Accept the opponent's last bid.
    Accept(Bid),
}

impl Action {
    /// Returns the bid carried by the action.
    #[must_use]
    pub const fn bid(&self) -> &Bid {
        match self {
            Self::Offer(bid) | Self::Accept(bid) => bid,
        }
    }
}

/// A negotiating agent.
pub struct NegotiationSession<R = StdRng> {
    id: SessionId,
    domain: Domain,
    preferences: Preferences,
    space: SortedOutcomeSpace,
    opponent: BidHistory,
    own: BidHistory,
    offering: ConcessionOfferer<FrequencyModel>,
    acceptance: ThresholdAcceptance,
    discount_factor: f64,
    agreement: Option<Bid>,
    rng: R,
}

impl NegotiationSession<StdRng> {
    /// Creates a session seeded from `config.seed`, or from entropy.
    ///
    /// # Errors
    ///
    /// See [`NegotiationSession::with_rng`].
    pub fn new(
        domain: Domain,
        preferences: Preferences,
        config: &AgentConfig,
        discount_factor: f64,
    ) -> Result<Self> {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::with_rng(domain, preferences, config, discount_factor, rng)
    }
}

impl<R: RngCore> NegotiationSession<R> {
    /// Creates a session with an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] for an invalid config,
    /// [`NegotiationError::InvalidInput`] for a discount factor outside
    /// `[0, 1]` or a domain too large to enumerate.
    pub fn with_rng(
        domain: Domain,
        preferences: Preferences,
        config: &AgentConfig,
        discount_factor: f64,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;
        if !(0.0..=1.0).contains(&discount_factor) {
            return Err(NegotiationError::invalid_input(format!(
                "discount factor must be in [0, 1], got {discount_factor}"
            )));
        }

        let space = SortedOutcomeSpace::new(&domain, &preferences, config.max_outcomes)?;
        let model = FrequencyModel::new(&domain, config.opponent_model)?;
        let offering = ConcessionOfferer::new(config, model)?;
        let acceptance = ThresholdAcceptance::new(config.accept_concession)?;
        let id = SessionId::new();

        info!(
            session = %id,
            issues = domain.issue_count(),
            outcomes = space.len(),
            uncertain = preferences.is_uncertain(),
            discount_factor,
            "negotiation session created"
        );

        Ok(Self {
            id,
            domain,
            preferences,
            space,
            opponent: BidHistory::new(),
            own: BidHistory::new(),
            offering,
            acceptance,
            discount_factor,
            agreement: None,
            rng,
        })
    }

    /// Records an opponent bid and lets the opponent model learn from it.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::PreconditionViolation`] if the bid does not
    /// fit the domain or the session already reached agreement, and the
    /// timeline's error for an invalid clock.
    pub fn receive_offer(&mut self, bid: Bid, timeline: &dyn Timeline) -> Result<()> {
        self.ensure_open()?;
        self.domain.check_bid(&bid)?;
        let elapsed = elapsed_fraction(timeline)?;

        let utility = self.preferences.utility(&bid);
        let record = BidRecord::discounted(bid, utility, self.discount_factor, elapsed);
        debug!(
            session = %self.id,
            utility = record.utility,
            discounted = record.discounted_utility,
            "received offer"
        );
        self.opponent.push(record);
        self.offering.observe(&self.opponent)
    }

    /// Decides this round's move.
    ///
    /// Opens with the best bid if the opponent has not bid yet. Otherwise
    /// computes the next bid and accepts the opponent's last offer if the
    /// acceptance strategy says so. Offered bids are added to the own history.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::PreconditionViolation`] once the session has
    /// reached agreement, or the error of any component.
    pub fn respond(&mut self, timeline: &dyn Timeline) -> Result<Action> {
        self.ensure_open()?;
        self.acceptance.next_round();

        let Some(last) = self.opponent.last().map(|r| r.bid.clone()) else {
            let opening = self.offering.opening_bid(&self.space)?;
            info!(session = %self.id, utility = opening.utility, "opening bid");
            return Ok(self.offer(opening));
        };

        let context = OfferContext {
            space: &self.space,
            preferences: &self.preferences,
            opponent: &self.opponent,
            own: &self.own,
            current_time: timeline.current_time(),
            total_time: timeline.total_time(),
            discount_factor: self.discount_factor,
        };
        let next = self.offering.next_bid(&context, &mut self.rng)?;

        let decision = self.acceptance.decide(&AcceptanceContext {
            opponent: &self.opponent,
            own: &self.own,
            my_next_utility: next.utility,
            current_time: timeline.current_time(),
            total_time: timeline.total_time(),
            discount_factor: self.discount_factor,
        })?;

        if decision.is_accept() {
            info!(
                session = %self.id,
                bid = %self.domain.describe(&last),
                "accepting opponent offer"
            );
            self.agreement = Some(last.clone());
            return Ok(Action::Accept(last));
        }
        Ok(self.offer(next))
    }

    /// Marks the session as agreed on `bid`, e.g. after the opponent accepted.
    pub fn conclude(&mut self, bid: Bid) {
        info!(session = %self.id, bid = %self.domain.describe(&bid), "agreement reached");
        self.agreement = Some(bid);
    }

    fn offer(&mut self, record: BidRecord) -> Action {
        let bid = record.bid.clone();
        self.own.push(record);
        Action::Offer(bid)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.agreement.is_some() {
            return Err(NegotiationError::precondition("session already reached agreement"));
        }
        Ok(())
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the domain.
    #[must_use]
    pub const fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Returns the agent's preferences.
    #[must_use]
    pub const fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Returns the outcome space.
    #[must_use]
    pub const fn outcome_space(&self) -> &SortedOutcomeSpace {
        &self.space
    }

    /// Returns the bids received from the opponent.
    #[must_use]
    pub const fn opponent_history(&self) -> &BidHistory {
        &self.opponent
    }

    /// Returns the bids offered by this agent.
    #[must_use]
    pub const fn own_history(&self) -> &BidHistory {
        &self.own
    }

    /// Returns the opponent model.
    #[must_use]
    pub fn opponent_model(&self) -> &FrequencyModel {
        self.offering.model()
    }

    /// Returns the agreed bid, if any.
    #[must_use]
    pub const fn agreement(&self) -> Option<&Bid> {
        self.agreement.as_ref()
    }
}

impl<R> fmt::Debug for NegotiationSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiationSession")
            .field("id", &self.id)
            .field("opponent_bids", &self.opponent.len())
            .field("own_bids", &self.own.len())
            .field("agreement", &self.agreement)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Issue;
    use crate::opponent::OpponentModel;
    use crate::timeline::RoundTimeline;
    use crate::utility::AdditiveUtility;

    fn domain() -> Domain {
        Domain::new(vec![
            Issue::new("price", ["low", "mid", "high"]),
            Issue::new("delivery", ["slow", "normal", "fast"]),
        ])
        .unwrap()
    }

    fn preferences(domain: &Domain) -> Preferences {
        Preferences::Known(
            AdditiveUtility::new(
                domain,
                vec![0.6, 0.4],
                vec![vec![0.0, 0.5, 1.0], vec![0.0, 0.5, 1.0]],
            )
            .unwrap(),
        )
    }

    fn session() -> NegotiationSession {
        let domain = domain();
        let preferences = preferences(&domain);
        NegotiationSession::new(domain, preferences, &AgentConfig::default().with_seed(11), 1.0)
            .unwrap()
    }

    #[test]
    fn opens_with_best_bid() {
        let mut session = session();
        let action = session.respond(&RoundTimeline::new(10)).unwrap();
        assert_eq!(action, Action::Offer(Bid::from_indices(&[2, 2])));
        assert_eq!(session.own_history().len(), 1);
    }

    #[test]
    fn rejects_low_offer_early() {
        let mut session = session();
        let timeline = RoundTimeline::new(100);
        session.receive_offer(Bid::from_indices(&[0, 0]), &timeline).unwrap();

        let action = session.respond(&timeline).unwrap();
        assert!(matches!(action, Action::Offer(_)));
        assert_eq!(session.opponent_history().len(), 1);
        assert_eq!(session.opponent_model().observations(), 1);
    }

    #[test]
    fn accepts_offer_that_matches_best() {
        let mut session = session();
        let timeline = RoundTimeline::new(100);
        session.receive_offer(Bid::from_indices(&[2, 2]), &timeline).unwrap();

        let action = session.respond(&timeline).unwrap();
        assert_eq!(action, Action::Accept(Bid::from_indices(&[2, 2])));
        assert_eq!(session.agreement(), Some(&Bid::from_indices(&[2, 2])));

        assert!(matches!(
            session.respond(&timeline),
            Err(NegotiationError::PreconditionViolation { .. })
        ));
    }

    #[test]
    fn foreign_bid_rejected() {
        let mut session = session();
        let result = session.receive_offer(Bid::from_indices(&[0, 7]), &RoundTimeline::new(10));
        assert!(matches!(
            result,
            Err(NegotiationError::PreconditionViolation { .. })
        ));
        assert!(session.opponent_history().is_empty());
    }

    #[test]
    fn discounted_utility_recorded() {
        let domain = domain();
        let preferences = preferences(&domain);
        let mut session =
            NegotiationSession::new(domain, preferences, &AgentConfig::default().with_seed(1), 0.5)
                .unwrap();
        let mut timeline = RoundTimeline::new(2);
        timeline.advance();
        session.receive_offer(Bid::from_indices(&[2, 2]), &timeline).unwrap();

        let record = session.opponent_history().last().unwrap();
        assert!((record.utility - 1.0).abs() < 1e-12);
        assert!((record.discounted_utility - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn invalid_discount_factor_rejected() {
        let domain = domain();
        let preferences = preferences(&domain);
        let result = NegotiationSession::new(domain, preferences, &AgentConfig::default(), 1.5);
        assert!(matches!(result, Err(NegotiationError::InvalidInput { .. })));
    }

    #[test]
    fn zero_round_budget_is_degenerate() {
        let mut session = session();
        let result = session.receive_offer(Bid::from_indices(&[0, 0]), &RoundTimeline::new(0));
        assert!(matches!(result, Err(NegotiationError::DegenerateState { .. })));
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let run = || {
            let mut session = session();
            let mut timeline = RoundTimeline::new(20);
            let mut offers = Vec::new();
            for round in 0..10 {
                session
                    .receive_offer(Bid::from_indices(&[round % 2, 0]), &timeline)
                    .unwrap();
                offers.push(session.respond(&timeline).unwrap());
                timeline.advance();
            }
            offers
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn conclude_closes_the_session() {
        let mut session = session();
        session.conclude(Bid::from_indices(&[1, 1]));
        assert!(session.respond(&RoundTimeline::new(10)).is_err());
    }
}
