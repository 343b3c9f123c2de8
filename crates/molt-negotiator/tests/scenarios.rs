//! End-to-end negotiation scenarios.
//!
//! Drives the public API the way a host would:
//! 1. Build a domain and the agent's preferences
//! 2. Feed opponent bids through a session
//! 3. Check what the agent learned, offered and accepted

use molt_negotiator::{
    AcceptanceInput, Action, AdditiveUtility, AgentConfig, Bid, ConcessionConfig,
    ConcessionInput, ConcessionScheduler, Decision, Domain, Issue, NegotiationError,
    NegotiationSession, OpponentModel, OutcomeSpace, Preferences, RankingEstimator,
    RoundTimeline, Timeline, UtilityFunction, decide,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

// ============================================================================
// Helper Functions
// ============================================================================

fn two_by_two() -> Domain {
    Domain::new(vec![
        Issue::new("issue1", ["x", "y"]),
        Issue::new("issue2", ["p", "q"]),
    ])
    .unwrap()
}

fn laptop_domain() -> Domain {
    Domain::new(vec![
        Issue::new("brand", ["generic", "known", "premium"]),
        Issue::new("memory", ["8gb", "16gb", "32gb"]),
        Issue::new("screen", ["13in", "15in"]),
    ])
    .unwrap()
}

fn laptop_buyer(domain: &Domain) -> AdditiveUtility {
    AdditiveUtility::new(
        domain,
        vec![0.3, 0.5, 0.2],
        vec![
            vec![0.2, 0.6, 1.0],
            vec![0.0, 0.6, 1.0],
            vec![0.4, 1.0],
        ],
    )
    .unwrap()
}

struct Clock {
    now: f64,
    total: f64,
}

impl Timeline for Clock {
    fn current_time(&self) -> f64 {
        self.now
    }

    fn total_time(&self) -> f64 {
        self.total
    }
}

// ============================================================================
// Opponent Model
// ============================================================================

#[test]
fn repeated_values_reveal_opponent_preferences() {
    let domain = two_by_two();
    let utility = AdditiveUtility::new(
        &domain,
        vec![0.5, 0.5],
        vec![vec![0.0, 1.0], vec![0.0, 1.0]],
    )
    .unwrap();
    let mut agent = NegotiationSession::new(
        domain.clone(),
        Preferences::Known(utility),
        &AgentConfig::default().with_seed(1),
        1.0,
    )
    .unwrap();
    let timeline = RoundTimeline::new(100);

    for labels in [
        [("issue1", "x"), ("issue2", "p")],
        [("issue1", "x"), ("issue2", "p")],
        [("issue1", "x"), ("issue2", "q")],
    ] {
        agent.receive_offer(domain.bid(&labels).unwrap(), &timeline).unwrap();
    }

    let model = agent.opponent_model();
    let issue1 = domain.issue_id("issue1").unwrap();
    let issue2 = domain.issue_id("issue2").unwrap();
    let value = |issue, label| domain.issue(issue).unwrap().value_id(label).unwrap();

    assert!(model.weight_of(issue1, value(issue1, "x")) > model.weight_of(issue1, value(issue1, "y")));
    assert!(model.weight_of(issue2, value(issue2, "p")) >= model.weight_of(issue2, value(issue2, "q")));
    assert!((model.issue_weights().iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

// ============================================================================
// Concession
// ============================================================================

#[test]
fn concession_from_best_to_floor() {
    let scheduler = ConcessionScheduler::new(ConcessionConfig::default()).unwrap();

    let start = scheduler
        .target_utility(&ConcessionInput::new(0.0, 100.0, 1.0, 0.4))
        .unwrap();
    let deadline = scheduler
        .target_utility(&ConcessionInput::new(100.0, 100.0, 1.0, 0.4))
        .unwrap();

    assert!((start - 1.0).abs() < 1e-9);
    assert!((deadline - 1.0 / 1.4).abs() < 1e-3);
}

#[test]
fn zero_deadline_surfaces_degenerate_state() {
    let scheduler = ConcessionScheduler::new(ConcessionConfig::default()).unwrap();
    let result = scheduler.target_utility(&ConcessionInput::new(0.0, 0.0, 1.0, 0.4));
    assert!(matches!(result, Err(NegotiationError::DegenerateState { .. })));
}

#[test]
fn heavy_discount_lowers_offers() {
    let domain = laptop_domain();
    let opponent_bid = domain
        .bid(&[("brand", "generic"), ("memory", "8gb"), ("screen", "13in")])
        .unwrap();
    let clock = Clock {
        now: 10.0,
        total: 100.0,
    };

    let offered_utility = |discount: f64| {
        let mut agent = NegotiationSession::new(
            domain.clone(),
            Preferences::Known(laptop_buyer(&domain)),
            &AgentConfig::default()
                .with_seed(9)
                .with_picking(molt_negotiator::BidPicking::NearestUtility),
            discount,
        )
        .unwrap();
        agent.receive_offer(opponent_bid.clone(), &clock).unwrap();
        match agent.respond(&clock).unwrap() {
            Action::Offer(bid) => laptop_buyer(&domain).utility(&bid),
            Action::Accept(_) => panic!("no reason to accept the worst bid"),
        }
    };

    assert!(offered_utility(0.2) < offered_utility(1.0));
}

// ============================================================================
// Acceptance
// ============================================================================

#[test]
fn acceptance_rule_scenarios() {
    assert_eq!(
        decide(&AcceptanceInput::new(0.9, 0.8, 0.85, 0.95)).unwrap(),
        Decision::Accept
    );
    assert_eq!(
        decide(&AcceptanceInput::new(0.5, 0.5, 0.9, 0.6)).unwrap(),
        Decision::Reject
    );
}

#[test]
fn agent_accepts_its_own_best_bid() {
    let domain = laptop_domain();
    let mut agent = NegotiationSession::new(
        domain.clone(),
        Preferences::Known(laptop_buyer(&domain)),
        &AgentConfig::default().with_seed(2),
        1.0,
    )
    .unwrap();
    let timeline = RoundTimeline::new(20);

    let best = agent.outcome_space().max_bid().unwrap().bid;
    agent.receive_offer(best.clone(), &timeline).unwrap();
    assert_eq!(agent.respond(&timeline).unwrap(), Action::Accept(best));
}

// ============================================================================
// Uncertainty Mode
// ============================================================================

#[test]
fn ranked_preferences_drive_a_session() {
    let domain = two_by_two();
    let ranking = [
        Bid::from_indices(&[1, 1]),
        Bid::from_indices(&[1, 0]),
        Bid::from_indices(&[0, 1]),
        Bid::from_indices(&[0, 0]),
    ];
    let estimator = RankingEstimator::from_ranking(&domain, &ranking).unwrap();
    assert!(estimator.utility(&ranking[3]) >= estimator.utility(&ranking[0]));

    let mut agent = NegotiationSession::with_rng(
        domain,
        Preferences::Ranked(estimator),
        &AgentConfig::default(),
        1.0,
        StdRng::seed_from_u64(4),
    )
    .unwrap();
    assert!(agent.preferences().is_uncertain());

    let opening = agent.respond(&RoundTimeline::new(10)).unwrap();
    assert_eq!(opening, Action::Offer(Bid::from_indices(&[0, 0])));
}

#[test]
fn empty_ranking_is_rejected() {
    let result = RankingEstimator::from_ranking(&two_by_two(), &[]);
    assert!(matches!(result, Err(NegotiationError::InvalidInput { .. })));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn json_config_drives_session() {
    let config = AgentConfig::from_json_str(
        r#"{
            "offer_concession": { "curve": "square_root" },
            "offering": { "picking": "nearest_utility", "endgame_margin": 3.0 },
            "seed": 5
        }"#,
    )
    .unwrap();
    let domain = laptop_domain();
    let mut agent = NegotiationSession::new(
        domain.clone(),
        Preferences::Known(laptop_buyer(&domain)),
        &config,
        1.0,
    )
    .unwrap();

    let opponent_bid = domain
        .bid(&[("brand", "known"), ("memory", "16gb"), ("screen", "13in")])
        .unwrap();
    let clock = Clock {
        now: 98.0,
        total: 100.0,
    };
    agent.receive_offer(opponent_bid.clone(), &clock).unwrap();

    // inside the endgame margin the agent settles on the opponent's best bid
    assert_eq!(agent.respond(&clock).unwrap().bid(), &opponent_bid);
}
