//! Scenario files for the `simulate` command.
//!
//! A scenario names a domain, a round budget, a discount factor and exactly
//! two parties. Each party brings its preferences, either as a full additive
//! utility or as a worst-to-best ranking of some bids, and an optional agent
//! configuration:
//!
//! ```json
//! {
//!   "name": "laptop",
//!   "rounds": 40,
//!   "domain": [{ "name": "brand", "values": ["generic", "premium"] }],
//!   "parties": [
//!     {
//!       "name": "buyer",
//!       "preferences": {
//!         "additive": {
//!           "issue_weights": { "brand": 1.0 },
//!           "evaluations": { "brand": { "generic": 0.2, "premium": 1.0 } }
//!         }
//!       }
//!     },
//!     {
//!       "name": "seller",
//!       "preferences": { "ranking": [{ "brand": "premium" }, { "brand": "generic" }] },
//!       "config": { "offering": { "picking": "nearest_utility" } }
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use molt_negotiator::{
    AdditiveUtility, AgentConfig, Bid, Domain, NegotiationSession, Preferences, RankingEstimator,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

fn default_rounds() -> u32 {
    100
}

fn default_discount_factor() -> f64 {
    1.0
}

/// A complete two-party simulation setup.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Issues and their values.
    pub domain: Domain,
    /// Round budget shared by both parties.
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Time discount applied to both parties.
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,
    /// The two negotiating parties, first mover first.
    pub parties: Vec<PartySpec>,
}

/// One party of a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct PartySpec {
    /// Party name, unique within the scenario.
    pub name: String,
    /// What the party knows about its own preferences.
    pub preferences: PreferenceSpec,
    /// Agent configuration; defaults apply to omitted fields.
    #[serde(default)]
    pub config: AgentConfig,
}

/// Preferences keyed by issue and value labels.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceSpec {
    /// Full additive utility.
    Additive {
        /// Weight per issue name.
        issue_weights: BTreeMap<String, f64>,
        /// Evaluation per issue name and value label.
        evaluations: BTreeMap<String, BTreeMap<String, f64>>,
    },
    /// Bids ordered from worst to best, each as issue name to value label.
    Ranking(Vec<BTreeMap<String, String>>),
}

/// A party ready to negotiate.
#[derive(Debug)]
pub struct Party {
    /// Party name.
    pub name: String,
    /// The party's session.
    pub session: NegotiationSession,
}

impl Scenario {
    /// Parses and validates a scenario.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Scenario`] for malformed JSON or an inconsistent scenario.
    pub fn from_json_str(json: &str) -> Result<Self, CliError> {
        let scenario: Self = serde_json::from_str(json)
            .map_err(|e| CliError::Scenario(format!("malformed scenario: {e}")))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reads a scenario file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] if the file cannot be read, otherwise see
    /// [`Scenario::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let json = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = json.len(), "scenario loaded");
        Self::from_json_str(&json)
    }

    /// Display name, `"unnamed"` when omitted.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Checks the party count, names, budget and discount.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Scenario`] describing the first problem found.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.parties.len() != 2 {
            return Err(CliError::Scenario(format!(
                "expected exactly two parties, got {}",
                self.parties.len()
            )));
        }
        if self.parties[0].name == self.parties[1].name {
            return Err(CliError::Scenario(format!(
                "duplicate party name: {}",
                self.parties[0].name
            )));
        }
        if self.rounds == 0 {
            return Err(CliError::Scenario("rounds must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(CliError::Scenario(format!(
                "discount factor must be in [0, 1], got {}",
                self.discount_factor
            )));
        }
        Ok(())
    }

    /// Builds one session per party.
    ///
    /// With a base `seed`, party `i` is seeded with `seed + i`, overriding
    /// any seed in its config.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Scenario`] for preferences that do not match the
    /// domain and [`CliError::Negotiation`] if the engine rejects them.
    pub fn build(&self, seed: Option<u64>) -> Result<Vec<Party>, CliError> {
        self.validate()?;
        self.parties
            .iter()
            .zip(0_u64..)
            .map(|(party, offset)| -> Result<Party, CliError> {
                let preferences = party.preferences.build(&self.domain)?;
                let config = match seed {
                    Some(base) => party.config.clone().with_seed(base.wrapping_add(offset)),
                    None => party.config.clone(),
                };
                let session = NegotiationSession::new(
                    self.domain.clone(),
                    preferences,
                    &config,
                    self.discount_factor,
                )?;
                Ok(Party {
                    name: party.name.clone(),
                    session,
                })
            })
            .collect()
    }
}

impl PreferenceSpec {
    /// Resolves labels against `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Scenario`] for unknown or missing issues and values.
    pub fn build(&self, domain: &Domain) -> Result<Preferences, CliError> {
        match self {
            Self::Additive {
                issue_weights,
                evaluations,
            } => {
                check_issue_names(domain, issue_weights.keys())?;
                check_issue_names(domain, evaluations.keys())?;

                let mut weights = Vec::with_capacity(domain.issue_count());
                let mut values = Vec::with_capacity(domain.issue_count());
                for issue in domain.issues() {
                    let weight = issue_weights.get(&issue.name).ok_or_else(|| {
                        CliError::Scenario(format!("missing weight for issue {}", issue.name))
                    })?;
                    let table = evaluations.get(&issue.name).ok_or_else(|| {
                        CliError::Scenario(format!("missing evaluations for issue {}", issue.name))
                    })?;
                    if let Some(unknown) = table.keys().find(|label| issue.value_id(label).is_none()) {
                        return Err(CliError::Scenario(format!(
                            "unknown value {unknown} for issue {}",
                            issue.name
                        )));
                    }
                    let row = issue
                        .values
                        .iter()
                        .map(|label| {
                            table.get(label).copied().ok_or_else(|| {
                                CliError::Scenario(format!(
                                    "missing evaluation for {}={label}",
                                    issue.name
                                ))
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    weights.push(*weight);
                    values.push(row);
                }
                Ok(Preferences::Known(AdditiveUtility::new(domain, weights, values)?))
            }
            Self::Ranking(entries) => {
                let ranking = entries
                    .iter()
                    .map(|entry| labeled_bid(domain, entry))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Preferences::Ranked(RankingEstimator::from_ranking(domain, &ranking)?))
            }
        }
    }
}

fn check_issue_names<'a>(
    domain: &Domain,
    mut names: impl Iterator<Item = &'a String>,
) -> Result<(), CliError> {
    match names.find(|name| domain.issue_id(name).is_none()) {
        Some(name) => Err(CliError::Scenario(format!("unknown issue {name}"))),
        None => Ok(()),
    }
}

fn labeled_bid(domain: &Domain, entry: &BTreeMap<String, String>) -> Result<Bid, CliError> {
    let labels: Vec<(&str, &str)> = entry
        .iter()
        .map(|(issue, value)| (issue.as_str(), value.as_str()))
        .collect();
    domain
        .bid(&labels)
        .map_err(|e| CliError::Scenario(format!("bad ranked bid: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use molt_negotiator::UtilityFunction;

    const SCENARIO: &str = r#"{
        "name": "two-issue",
        "rounds": 20,
        "domain": [
            { "name": "price", "values": ["low", "high"] },
            { "name": "speed", "values": ["slow", "fast"] }
        ],
        "parties": [
            {
                "name": "buyer",
                "preferences": {
                    "additive": {
                        "issue_weights": { "price": 0.7, "speed": 0.3 },
                        "evaluations": {
                            "price": { "low": 1.0, "high": 0.0 },
                            "speed": { "slow": 0.0, "fast": 1.0 }
                        }
                    }
                }
            },
            {
                "name": "seller",
                "preferences": {
                    "ranking": [
                        { "price": "low", "speed": "fast" },
                        { "price": "high", "speed": "fast" },
                        { "price": "high", "speed": "slow" }
                    ]
                },
                "config": { "bias": 0.5 }
            }
        ]
    }"#;

    fn with_parties(parties: &str) -> String {
        format!(
            r#"{{ "domain": [{{ "name": "price", "values": ["low", "high"] }}], "parties": {parties} }}"#
        )
    }

    #[test]
    fn parses_defaults_and_names() {
        let scenario = Scenario::from_json_str(SCENARIO).unwrap();
        assert_eq!(scenario.display_name(), "two-issue");
        assert_eq!(scenario.rounds, 20);
        assert!((scenario.discount_factor - 1.0).abs() < f64::EPSILON);
        assert!((scenario.parties[1].config.bias - 0.5).abs() < f64::EPSILON);
        assert!((scenario.parties[0].config.bias - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn builds_known_and_ranked_parties() {
        let scenario = Scenario::from_json_str(SCENARIO).unwrap();
        let parties = scenario.build(Some(3)).unwrap();
        assert_eq!(parties.len(), 2);
        assert!(!parties[0].session.preferences().is_uncertain());
        assert!(parties[1].session.preferences().is_uncertain());

        let domain = &scenario.domain;
        let best = domain.bid(&[("price", "low"), ("speed", "fast")]).unwrap();
        assert!((parties[0].session.preferences().utility(&best) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn one_party_is_rejected() {
        let json = with_parties(
            r#"[{ "name": "solo", "preferences": { "ranking": [{ "price": "low" }] } }]"#,
        );
        let err = Scenario::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("exactly two parties"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let party = r#"{ "name": "twin", "preferences": { "ranking": [{ "price": "low" }] } }"#;
        let json = with_parties(&format!("[{party}, {party}]"));
        let err = Scenario::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("duplicate party name"));
    }

    #[test]
    fn malformed_json_is_a_scenario_error() {
        let err = Scenario::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, CliError::Scenario(_)));
    }

    #[test]
    fn unknown_issue_in_weights() {
        let domain = Domain::new(vec![molt_negotiator::Issue::new("price", ["low", "high"])]).unwrap();
        let spec = PreferenceSpec::Additive {
            issue_weights: BTreeMap::from([("colour".to_string(), 1.0)]),
            evaluations: BTreeMap::new(),
        };
        let err = spec.build(&domain).unwrap_err();
        assert_eq!(err.to_string(), "scenario error: unknown issue colour");
    }

    #[test]
    fn missing_evaluation() {
        let domain = Domain::new(vec![molt_negotiator::Issue::new("price", ["low", "high"])]).unwrap();
        let spec = PreferenceSpec::Additive {
            issue_weights: BTreeMap::from([("price".to_string(), 1.0)]),
            evaluations: BTreeMap::from([(
                "price".to_string(),
                BTreeMap::from([("low".to_string(), 1.0)]),
            )]),
        };
        let err = spec.build(&domain).unwrap_err();
        assert!(err.to_string().contains("missing evaluation for price=high"));
    }

    #[test]
    fn ranking_with_unknown_value() {
        let domain = Domain::new(vec![molt_negotiator::Issue::new("price", ["low", "high"])]).unwrap();
        let spec = PreferenceSpec::Ranking(vec![BTreeMap::from([(
            "price".to_string(),
            "free".to_string(),
        )])]);
        assert!(matches!(spec.build(&domain), Err(CliError::Scenario(_))));
    }

    #[test]
    fn empty_ranking_reaches_the_engine() {
        let domain = Domain::new(vec![molt_negotiator::Issue::new("price", ["low", "high"])]).unwrap();
        let spec = PreferenceSpec::Ranking(Vec::new());
        assert!(matches!(spec.build(&domain), Err(CliError::Negotiation(_))));
    }
}
