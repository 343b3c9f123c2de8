//! Discrete negotiation domains and bids.
//!
//! A [`Domain`] is an ordered list of issues, each with an ordered list of
//! discrete values. Issue and value positions are resolved once when the
//! domain is built, so a [`Bid`] is a dense vector of [`ValueId`]s indexed
//! by [`IssueId`] and every table in the engine can be a plain array.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NegotiationError, Result};

/// Position of an issue within its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueId(usize);

impl IssueId {
    /// Creates an issue id from a raw position.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw position.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issue#{}", self.0)
    }
}

/// Position of a value within its issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(usize);

impl ValueId {
    /// Creates a value id from a raw position.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw position.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value#{}", self.0)
    }
}

/// A discrete issue and the values it can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue name, unique within the domain.
    pub name: String,
    /// Admissible values, unique within the issue.
    pub values: Vec<String>,
}

impl Issue {
    /// Creates a new issue.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of values.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Looks up a value by label.
    #[must_use]
    pub fn value_id(&self, label: &str) -> Option<ValueId> {
        self.values.iter().position(|v| v == label).map(ValueId::new)
    }

    /// Returns the label of a value.
    #[must_use]
    pub fn value_label(&self, value: ValueId) -> Option<&str> {
        self.values.get(value.index()).map(String::as_str)
    }
}

/// One complete assignment of a value to every issue of a domain.
///
/// Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bid(Vec<ValueId>);

impl Bid {
    /// Creates a bid from one value per issue, in issue order.
    #[must_use]
    pub fn new(values: Vec<ValueId>) -> Self {
        Self(values)
    }

    /// Creates a bid from raw value positions.
    #[must_use]
    pub fn from_indices(indices: &[usize]) -> Self {
        Self(indices.iter().copied().map(ValueId::new).collect())
    }

    /// Returns the value chosen for an issue.
    #[must_use]
    pub fn value(&self, issue: IssueId) -> Option<ValueId> {
        self.0.get(issue.index()).copied()
    }

    /// Returns all values in issue order.
    #[must_use]
    pub fn values(&self) -> &[ValueId] {
        &self.0
    }

    /// Returns the number of issues covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the bid covers no issue.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(issue, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (IssueId, ValueId)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(i, v)| (IssueId::new(i), *v))
    }
}

/// A discrete multi-issue negotiation domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Issue>", into = "Vec<Issue>")]
pub struct Domain {
    issues: Vec<Issue>,
}

impl Domain {
    /// Creates a domain from its issues.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] if there are no issues, an
    /// issue has no values, or names are duplicated.
    pub fn new(issues: Vec<Issue>) -> Result<Self> {
        if issues.is_empty() {
            return Err(NegotiationError::invalid_input("domain has no issues"));
        }

        let mut names = HashSet::new();
        for issue in &issues {
            if !names.insert(issue.name.as_str()) {
                return Err(NegotiationError::invalid_input(format!(
                    "duplicate issue name '{}'",
                    issue.name
                )));
            }
            if issue.values.is_empty() {
                return Err(NegotiationError::invalid_input(format!(
                    "issue '{}' has no values",
                    issue.name
                )));
            }
            let mut values = HashSet::new();
            for value in &issue.values {
                if !values.insert(value.as_str()) {
                    return Err(NegotiationError::invalid_input(format!(
                        "duplicate value '{value}' in issue '{}'",
                        issue.name
                    )));
                }
            }
        }

        Ok(Self { issues })
    }

    /// Returns the issues in order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Returns an issue by id.
    #[must_use]
    pub fn issue(&self, issue: IssueId) -> Option<&Issue> {
        self.issues.get(issue.index())
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Iterates over all issue ids.
    pub fn issue_ids(&self) -> impl Iterator<Item = IssueId> {
        (0..self.issues.len()).map(IssueId::new)
    }

    /// Looks up an issue by name.
    #[must_use]
    pub fn issue_id(&self, name: &str) -> Option<IssueId> {
        self.issues
            .iter()
            .position(|issue| issue.name == name)
            .map(IssueId::new)
    }

    /// Returns the number of values of every issue, in issue order.
    #[must_use]
    pub fn value_counts(&self) -> Vec<usize> {
        self.issues.iter().map(Issue::value_count).collect()
    }

    /// Builds a bid from `(issue, value)` labels.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::PreconditionViolation`] if a label is
    /// unknown, an issue is assigned twice, or an issue is left out.
    pub fn bid(&self, labels: &[(&str, &str)]) -> Result<Bid> {
        let mut values: Vec<Option<ValueId>> = vec![None; self.issues.len()];
        for (issue_name, value_label) in labels {
            let issue_id = self.issue_id(issue_name).ok_or_else(|| {
                NegotiationError::precondition(format!("unknown issue '{issue_name}'"))
            })?;
            let issue = &self.issues[issue_id.index()];
            let value_id = issue.value_id(value_label).ok_or_else(|| {
                NegotiationError::precondition(format!(
                    "unknown value '{value_label}' for issue '{issue_name}'"
                ))
            })?;
            if values[issue_id.index()].replace(value_id).is_some() {
                return Err(NegotiationError::precondition(format!(
                    "issue '{issue_name}' assigned twice"
                )));
            }
        }

        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| {
                    NegotiationError::precondition(format!(
                        "issue '{}' has no value",
                        self.issues[i].name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Bid::new)
    }

    /// Checks that a bid assigns an existing value to every issue.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::PreconditionViolation`] on arity mismatch
    /// or an out-of-range value.
    pub fn check_bid(&self, bid: &Bid) -> Result<()> {
        if bid.len() != self.issues.len() {
            return Err(NegotiationError::precondition(format!(
                "bid covers {} issues, domain has {}",
                bid.len(),
                self.issues.len()
            )));
        }
        for (issue_id, value) in bid.iter() {
            let issue = &self.issues[issue_id.index()];
            if value.index() >= issue.value_count() {
                return Err(NegotiationError::precondition(format!(
                    "{value} is not a value of issue '{}'",
                    issue.name
                )));
            }
        }
        Ok(())
    }

    /// Returns the number of distinct bids, or `None` on overflow.
    #[must_use]
    pub fn outcome_count(&self) -> Option<usize> {
        self.issues
            .iter()
            .try_fold(1usize, |acc, issue| acc.checked_mul(issue.value_count()))
    }

    /// Enumerates every bid of the domain.
    #[must_use]
    pub fn enumerate(&self) -> BidEnumerator {
        BidEnumerator {
            radix: self.value_counts(),
            next: Some(vec![0; self.issues.len()]),
        }
    }

    /// Renders a bid with issue and value labels.
    #[must_use]
    pub fn describe(&self, bid: &Bid) -> String {
        bid.iter()
            .map(|(issue_id, value)| {
                let issue = self.issue(issue_id);
                let name = issue.map_or("?", |i| i.name.as_str());
                let label = issue.and_then(|i| i.value_label(value)).unwrap_or("?");
                format!("{name}={label}")
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TryFrom<Vec<Issue>> for Domain {
    type Error = NegotiationError;

    fn try_from(issues: Vec<Issue>) -> Result<Self> {
        Self::new(issues)
    }
}

impl From<Domain> for Vec<Issue> {
    fn from(domain: Domain) -> Self {
        domain.issues
    }
}

/// Odometer-style iterator over every bid of a domain.
#[derive(Debug, Clone)]
pub struct BidEnumerator {
    radix: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Iterator for BidEnumerator {
    type Item = Bid;

    fn next(&mut self) -> Option<Bid> {
        let current = self.next.take()?;
        let bid = Bid::from_indices(&current);

        let mut digits = current;
        for position in (0..digits.len()).rev() {
            digits[position] += 1;
            if digits[position] < self.radix[position] {
                self.next = Some(digits);
                return Some(bid);
            }
            digits[position] = 0;
        }

        Some(bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_domain() -> Domain {
        Domain::new(vec![
            Issue::new("price", ["low", "mid", "high"]),
            Issue::new("delivery", ["fast", "slow"]),
        ])
        .unwrap()
    }

    #[test]
    fn domain_rejects_empty() {
        let err = Domain::new(Vec::new()).unwrap_err();
        assert!(matches!(err, NegotiationError::InvalidInput { .. }));
    }

    #[test]
    fn domain_rejects_issue_without_values() {
        let result = Domain::new(vec![Issue::new("price", Vec::<String>::new())]);
        assert!(matches!(result, Err(NegotiationError::InvalidInput { .. })));
    }

    #[test]
    fn domain_rejects_duplicate_issue() {
        let result = Domain::new(vec![
            Issue::new("price", ["low"]),
            Issue::new("price", ["high"]),
        ]);
        assert!(matches!(result, Err(NegotiationError::InvalidInput { .. })));
    }

    #[test]
    fn domain_rejects_duplicate_value() {
        let result = Domain::new(vec![Issue::new("price", ["low", "low"])]);
        assert!(matches!(result, Err(NegotiationError::InvalidInput { .. })));
    }

    #[test]
    fn bid_from_labels() {
        let domain = sample_domain();
        let bid = domain.bid(&[("delivery", "slow"), ("price", "mid")]).unwrap();
        assert_eq!(bid, Bid::from_indices(&[1, 1]));
        assert_eq!(domain.describe(&bid), "price=mid, delivery=slow");
    }

    #[test]
    fn bid_from_labels_requires_every_issue() {
        let domain = sample_domain();
        let result = domain.bid(&[("price", "mid")]);
        assert!(matches!(
            result,
            Err(NegotiationError::PreconditionViolation { .. })
        ));
    }

    #[test]
    fn bid_from_labels_rejects_unknown_value() {
        let domain = sample_domain();
        let result = domain.bid(&[("price", "free"), ("delivery", "fast")]);
        assert!(matches!(
            result,
            Err(NegotiationError::PreconditionViolation { .. })
        ));
    }

    #[test]
    fn check_bid_detects_out_of_range_value() {
        let domain = sample_domain();
        assert!(domain.check_bid(&Bid::from_indices(&[2, 1])).is_ok());
        assert!(domain.check_bid(&Bid::from_indices(&[3, 0])).is_err());
        assert!(domain.check_bid(&Bid::from_indices(&[0])).is_err());
    }

    #[test]
    fn enumerate_covers_every_outcome_once() {
        let domain = sample_domain();
        let bids: Vec<Bid> = domain.enumerate().collect();
        assert_eq!(Some(bids.len()), domain.outcome_count());
        assert_eq!(bids.len(), 6);

        let unique: HashSet<&Bid> = bids.iter().collect();
        assert_eq!(unique.len(), 6);
        assert!(bids.iter().all(|b| domain.check_bid(b).is_ok()));
    }

    #[test]
    fn domain_serde_validates() {
        let json = r#"[{"name":"price","values":["low","high"]}]"#;
        let domain: Domain = serde_json::from_str(json).unwrap();
        assert_eq!(domain.issue_count(), 1);

        let bad = r#"[{"name":"price","values":[]}]"#;
        assert!(serde_json::from_str::<Domain>(bad).is_err());
    }

    #[test]
    fn ids_display() {
        assert_eq!(IssueId::new(2).to_string(), "issue#2");
        assert_eq!(ValueId::new(0).to_string(), "value#0");
    }
}
