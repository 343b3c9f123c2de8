//! Outcome-space queries over the agent's own utility.

use tracing::debug;

use crate::domain::Domain;
use crate::error::{NegotiationError, Result};
use crate::history::BidRecord;
use crate::utility::UtilityFunction;

/// Read-only queries over all bids of a domain, evaluated to self.
pub trait OutcomeSpace {
    /// All bids whose utility lies in `[low, high]`, best first.
    fn bids_in_range(&self, low: f64, high: f64) -> Vec<BidRecord>;

    /// The bid whose utility is closest to `target`.
    ///
    /// # Errors
    ///
    /// Returns error if the space holds no bid.
    fn bid_near_utility(&self, target: f64) -> Result<BidRecord>;

    /// The bid with the highest utility.
    ///
    /// # Errors
    ///
    /// Returns error if the space holds no bid.
    fn max_bid(&self) -> Result<BidRecord>;
}

/// Every bid of a domain, sorted by utility to self (descending).
#[derive(Debug, Clone)]
pub struct SortedOutcomeSpace {
    records: Vec<BidRecord>,
}

impl SortedOutcomeSpace {
    /// Enumerates and evaluates the whole domain.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] if the domain has more than
    /// `max_outcomes` bids.
    pub fn new(domain: &Domain, utility: &dyn UtilityFunction, max_outcomes: usize) -> Result<Self> {
        match domain.outcome_count() {
            Some(count) if count <= max_outcomes => {}
            count => {
                return Err(NegotiationError::invalid_input(format!(
                    "domain has {} outcomes, limit is {max_outcomes}",
                    count.map_or_else(|| "too many".to_string(), |c| c.to_string())
                )));
            }
        }

        let mut records: Vec<BidRecord> = domain
            .enumerate()
            .map(|bid| {
                let u = utility.utility(&bid);
                BidRecord::new(bid, u)
            })
            .collect();
        records.sort_by(|a, b| b.utility.total_cmp(&a.utility));

        debug!(outcomes = records.len(), "built sorted outcome space");
        Ok(Self { records })
    }

    /// Returns the number of bids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the space holds no bid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns all records, best first.
    #[must_use]
    pub fn records(&self) -> &[BidRecord] {
        &self.records
    }
}

impl OutcomeSpace for SortedOutcomeSpace {
    fn bids_in_range(&self, low: f64, high: f64) -> Vec<BidRecord> {
        let start = self.records.partition_point(|r| r.utility > high);
        let end = self.records.partition_point(|r| r.utility >= low);
        if start >= end {
            return Vec::new();
        }
        self.records[start..end].to_vec()
    }

    fn bid_near_utility(&self, target: f64) -> Result<BidRecord> {
        self.records
            .iter()
            .min_by(|a, b| {
                (a.utility - target)
                    .abs()
                    .total_cmp(&(b.utility - target).abs())
            })
            .cloned()
            .ok_or_else(|| NegotiationError::invalid_input("outcome space is empty"))
    }

    fn max_bid(&self) -> Result<BidRecord> {
        self.records
            .first()
            .cloned()
            .ok_or_else(|| NegotiationError::invalid_input("outcome space is empty"))
    }
}
