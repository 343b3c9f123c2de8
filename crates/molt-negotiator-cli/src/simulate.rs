//! Alternating-offers simulation between the two parties of a scenario.

use std::io::Write;

use chrono::{DateTime, Utc};
use molt_negotiator::{Action, Bid, RoundTimeline, UtilityFunction};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CliError;
use crate::output::TableDisplay;
use crate::scenario::{Party, Scenario};

/// What a party did on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Move {
    /// Proposed a bid.
    Offer,
    /// Accepted the other party's last bid.
    Accept,
}

/// One turn of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    /// Round number.
    pub round: u32,
    /// Acting party.
    pub party: String,
    /// What the party did.
    pub action: Move,
    /// The bid offered or accepted, with labels.
    pub bid: String,
    /// Utility of the bid to the acting party.
    pub utility: f64,
}

/// Utility of the agreement to one party.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyUtility {
    /// Party name.
    pub party: String,
    /// Utility of the agreed bid.
    pub utility: f64,
}

/// How the session ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// One party accepted.
    Agreement {
        /// The agreed bid, with labels.
        bid: String,
        /// Round of the acceptance.
        round: u32,
        /// Undiscounted utility per party.
        utilities: Vec<PartyUtility>,
    },
    /// The deadline passed without agreement.
    NoAgreement,
}

/// Result of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    /// Scenario name.
    pub scenario: String,
    /// Session start.
    pub started_at: DateTime<Utc>,
    /// Session end.
    pub finished_at: DateTime<Utc>,
    /// Round budget.
    pub rounds: u32,
    /// Rounds played, the accepting round included.
    pub rounds_used: u32,
    /// How the session ended.
    pub outcome: Outcome,
    /// Every turn in order.
    pub transcript: Vec<Turn>,
}

impl SimulationReport {
    /// Returns true if the parties agreed.
    #[must_use]
    pub const fn is_agreement(&self) -> bool {
        matches!(self.outcome, Outcome::Agreement { .. })
    }
}

/// Runs the scenario until a party accepts or the round budget is spent.
///
/// The first party opens every round; the second answers.
///
/// # Errors
///
/// Returns an error if the scenario cannot be built or a session rejects a turn.
pub fn run(scenario: &Scenario, seed: Option<u64>) -> Result<SimulationReport, CliError> {
    let [mut first, mut second]: [Party; 2] = scenario
        .build(seed)?
        .try_into()
        .map_err(|_| CliError::Scenario("expected exactly two parties".into()))?;
    let started_at = Utc::now();
    info!(
        scenario = scenario.display_name(),
        rounds = scenario.rounds,
        "simulation started"
    );

    let mut timeline = RoundTimeline::new(scenario.rounds);
    let mut transcript = Vec::new();
    let mut pending: Option<Bid> = None;
    let mut agreed: Option<(Bid, u32)> = None;
    let mut turn = 0;

    while !timeline.is_expired() {
        let (me, other) = if turn == 0 {
            (&mut first, &mut second)
        } else {
            (&mut second, &mut first)
        };

        if let Some(bid) = pending.take() {
            me.session.receive_offer(bid, &timeline)?;
        }
        let action = me.session.respond(&timeline)?;
        let utility = me.session.preferences().utility(action.bid());
        let description = me.session.domain().describe(action.bid());
        debug!(round = timeline.round(), party = %me.name, bid = %description, utility, "turn");

        let (kind, bid) = match action {
            Action::Offer(bid) => (Move::Offer, bid),
            Action::Accept(bid) => (Move::Accept, bid),
        };
        transcript.push(Turn {
            round: timeline.round(),
            party: me.name.clone(),
            action: kind,
            bid: description,
            utility,
        });

        if kind == Move::Accept {
            other.session.conclude(bid.clone());
            agreed = Some((bid, timeline.round()));
            break;
        }
        pending = Some(bid);

        turn = 1 - turn;
        if turn == 0 {
            timeline.advance();
        }
    }

    let (outcome, rounds_used) = match agreed {
        Some((bid, round)) => {
            let utilities = [&first, &second]
                .into_iter()
                .map(|party| PartyUtility {
                    party: party.name.clone(),
                    utility: party.session.preferences().utility(&bid),
                })
                .collect();
            let outcome = Outcome::Agreement {
                bid: first.session.domain().describe(&bid),
                round,
                utilities,
            };
            (outcome, round + 1)
        }
        None => (Outcome::NoAgreement, timeline.round()),
    };
    info!(
        scenario = scenario.display_name(),
        rounds_used,
        agreement = matches!(outcome, Outcome::Agreement { .. }),
        "simulation finished"
    );

    Ok(SimulationReport {
        scenario: scenario.display_name().to_string(),
        started_at,
        finished_at: Utc::now(),
        rounds: scenario.rounds,
        rounds_used,
        outcome,
        transcript,
    })
}

impl TableDisplay for SimulationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Simulation: {}", self.scenario)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Started:          {}", self.started_at.to_rfc3339())?;
        writeln!(writer, "Finished:         {}", self.finished_at.to_rfc3339())?;
        writeln!(writer, "Rounds:           {} of {}", self.rounds_used, self.rounds)?;
        writeln!(writer)?;

        writeln!(
            writer,
            "{:<6} {:<12} {:<7} {:>8}  BID",
            "ROUND", "PARTY", "ACTION", "UTILITY"
        )?;
        writeln!(writer, "{}", "─".repeat(60))?;
        for turn in &self.transcript {
            let action = match turn.action {
                Move::Offer => "offer",
                Move::Accept => "accept",
            };
            writeln!(
                writer,
                "{:<6} {:<12} {:<7} {:>8.4}  {}",
                turn.round, turn.party, action, turn.utility, turn.bid
            )?;
        }
        writeln!(writer)?;

        match &self.outcome {
            Outcome::Agreement {
                bid,
                round,
                utilities,
            } => {
                writeln!(writer, "Agreement in round {round}: {bid}")?;
                for party in utilities {
                    writeln!(writer, "  {:<16}{:.4}", party.party, party.utility)?;
                }
            }
            Outcome::NoAgreement => writeln!(writer, "No agreement before the deadline")?,
        }
        Ok(())
    }
}
