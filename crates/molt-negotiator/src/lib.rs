//! Adaptive concession and preference learning for bilateral MOLT bargaining.
//!
//! `molt-negotiator` is the decision engine of one negotiating agent in an
//! alternating-offers session over a discrete multi-issue domain. Each round
//! it decides what to offer next and whether to accept the opponent's last
//! offer, under a deadline and optionally a time discount.
//!
//! # Features
//!
//! - **Concession**: quadratic or square-root decay of the target utility,
//!   with a floor and a discount-aware rule
//! - **Opponent modeling**: frequency counting of the values the opponent repeats
//! - **Bid rating**: weighted distance to the opponent's first, best and last bids
//! - **Stochastic selection**: rank-biased sampling over rated candidates
//! - **Uncertainty mode**: closed-form utility estimate from an ordinal ranking
//! - **Acceptance**: fixed comparison rule, one decision per round
//!
//! # Example
//!
//! ```rust
//! use molt_negotiator::{
//!     Action, AdditiveUtility, AgentConfig, Domain, Issue, NegotiationSession, Preferences,
//!     RoundTimeline,
//! };
//!
//! let domain = Domain::new(vec![
//!     Issue::new("price", ["low", "mid", "high"]),
//!     Issue::new("delivery", ["slow", "fast"]),
//! ])?;
//! let utility = AdditiveUtility::new(
//!     &domain,
//!     vec![0.7, 0.3],
//!     vec![vec![0.0, 0.6, 1.0], vec![0.2, 1.0]],
//! )?;
//!
//! let config = AgentConfig::default().with_seed(42);
//! let mut agent = NegotiationSession::new(domain.clone(), Preferences::Known(utility), &config, 1.0)?;
//!
//! let timeline = RoundTimeline::new(50);
//! let opponent_bid = domain.bid(&[("price", "low"), ("delivery", "fast")])?;
//! agent.receive_offer(opponent_bid, &timeline)?;
//!
//! match agent.respond(&timeline)? {
//!     Action::Offer(bid) => println!("counter-offer: {}", domain.describe(&bid)),
//!     Action::Accept(bid) => println!("accepted: {}", domain.describe(&bid)),
//! }
//! # Ok::<(), molt_negotiator::NegotiationError>(())
//! ```
//!
//! # Uncertainty Mode
//!
//! When only a ranking of some bids is known (worst first), utilities are
//! estimated once per session. An estimate that scores the best-ranked bid
//! below the worst-ranked one is rejected as degenerate:
//!
//! ```rust
//! use molt_negotiator::{Bid, Domain, Issue, RankingEstimator, UtilityFunction};
//!
//! let domain = Domain::new(vec![
//!     Issue::new("first", ["x", "y"]),
//!     Issue::new("second", ["p", "q"]),
//! ])?;
//! let ranking = [
//!     Bid::from_indices(&[1, 1]),
//!     Bid::from_indices(&[0, 1]),
//!     Bid::from_indices(&[0, 0]),
//! ];
//! let estimator = RankingEstimator::from_ranking(&domain, &ranking)?;
//! assert!(estimator.utility(&ranking[2]) >= estimator.utility(&ranking[0]));
//! # Ok::<(), molt_negotiator::NegotiationError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              NegotiationSession              │
//! │  ┌────────────────────────────────────────┐  │
//! │  │           ConcessionOfferer            │  │
//! │  │  ┌───────────┐ ┌──────────┐ ┌────────┐ │  │
//! │  │  │Concession │ │Frequency │ │ Rating │ │  │
//! │  │  │ Scheduler │ │  Model   │ │Selector│ │  │
//! │  │  └───────────┘ └──────────┘ └────────┘ │  │
//! │  └────────────────────────────────────────┘  │
//! │  ┌───────────────────┐ ┌──────────────────┐  │
//! │  │ThresholdAcceptance│ │SortedOutcomeSpace│  │
//! │  │ (AcceptanceRound) │ │  (Preferences)   │  │
//! │  └───────────────────┘ └──────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

pub mod acceptance;
pub mod concession;
pub mod config;
pub mod domain;
pub mod error;
pub mod estimator;
pub mod history;
pub mod offering;
pub mod opponent;
pub mod outcome;
pub mod rating;
pub mod selector;
pub mod session;
pub mod timeline;
pub mod utility;

// Re-export main types
pub use acceptance::{
    AcceptanceContext, AcceptanceInput, AcceptanceRound, AcceptanceStrategy, Decision, RoundState,
    ThresholdAcceptance, decide,
};
pub use concession::{ConcessionInput, ConcessionScheduler, NOMINAL_MAX_UTILITY};
pub use config::{
    AgentConfig, BidPicking, ConcessionConfig, ConcessionCurve, CurveBase, OfferingConfig,
    OpponentModelConfig, ReferenceWeights,
};
pub use domain::{Bid, BidEnumerator, Domain, Issue, IssueId, ValueId};
pub use error::{NegotiationError, Result};
pub use estimator::RankingEstimator;
pub use history::{BidHistory, BidRecord};
pub use offering::{ConcessionOfferer, OfferContext, OfferingStrategy};
pub use opponent::{FrequencyModel, OpponentModel};
pub use outcome::{OutcomeSpace, SortedOutcomeSpace};
pub use rating::{ReferenceBids, rate, rate_all};
pub use selector::{BidSelector, RatingSelector, SelectionContext, StochasticBidSelector};
pub use session::{Action, NegotiationSession, SessionId};
pub use timeline::{RoundTimeline, Timeline, elapsed_fraction, time_left_fraction};
pub use utility::{AdditiveUtility, Preferences, UtilityFunction};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::acceptance::{AcceptanceStrategy, Decision};
    pub use crate::config::{AgentConfig, BidPicking, ConcessionCurve};
    pub use crate::domain::{Bid, Domain, Issue};
    pub use crate::error::{NegotiationError, Result};
    pub use crate::estimator::RankingEstimator;
    pub use crate::offering::OfferingStrategy;
    pub use crate::opponent::OpponentModel;
    pub use crate::outcome::OutcomeSpace;
    pub use crate::session::{Action, NegotiationSession};
    pub use crate::timeline::{RoundTimeline, Timeline};
    pub use crate::utility::{AdditiveUtility, Preferences, UtilityFunction};
}
