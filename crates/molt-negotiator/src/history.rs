//! Append-only bid histories.

use serde::{Deserialize, Serialize};

use crate::domain::Bid;

/// A bid with its cached utility to self.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRecord {
    /// The bid.
    pub bid: Bid,
    /// Undiscounted utility to self.
    pub utility: f64,
    /// Utility to self after time discounting; equals `utility` without discount.
    pub discounted_utility: f64,
}

impl BidRecord {
    /// Creates an undiscounted record.
    #[must_use]
    pub fn new(bid: Bid, utility: f64) -> Self {
        Self {
            bid,
            utility,
            discounted_utility: utility,
        }
    }

    /// Creates a record discounted as `utility × discount^elapsed`.
    #[must_use]
    pub fn discounted(bid: Bid, utility: f64, discount_factor: f64, elapsed: f64) -> Self {
        Self {
            bid,
            utility,
            discounted_utility: utility * discount_factor.powf(elapsed),
        }
    }
}

/// Chronological record of one party's bids.
///
/// First, last and best (by undiscounted utility to self) are tracked
/// incrementally. Ties keep the earliest best.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BidHistory {
    records: Vec<BidRecord>,
    best: usize,
}

impl BidHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&mut self, record: BidRecord) {
        if let Some(best) = self.records.get(self.best) {
            if record.utility > best.utility {
                self.best = self.records.len();
            }
        }
        self.records.push(record);
    }

    /// Returns the first record.
    #[must_use]
    pub fn first(&self) -> Option<&BidRecord> {
        self.records.first()
    }

    /// Returns the most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&BidRecord> {
        self.records.last()
    }

    /// Returns the record with the highest utility to self.
    #[must_use]
    pub fn best(&self) -> Option<&BidRecord> {
        self.records.get(self.best)
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over records in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &BidRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, utility: f64) -> BidRecord {
        BidRecord::new(Bid::from_indices(&[index]), utility)
    }

    #[test]
    fn empty_history_has_no_references() {
        let history = BidHistory::new();
        assert!(history.is_empty());
        assert!(history.first().is_none());
        assert!(history.last().is_none());
        assert!(history.best().is_none());
    }

    #[test]
    fn history_tracks_first_last_best() {
        let mut history = BidHistory::new();
        history.push(record(0, 0.3));
        history.push(record(1, 0.7));
        history.push(record(2, 0.5));

        assert_eq!(history.len(), 3);
        assert_eq!(history.first().map(|r| r.utility), Some(0.3));
        assert_eq!(history.last().map(|r| r.utility), Some(0.5));
        assert_eq!(history.best().map(|r| r.utility), Some(0.7));
    }

    #[test]
    fn best_keeps_earliest_on_tie() {
        let mut history = BidHistory::new();
        history.push(record(0, 0.6));
        history.push(record(1, 0.6));
        assert_eq!(history.best().map(|r| r.bid.clone()), Some(Bid::from_indices(&[0])));
    }

    #[test]
    fn discounted_record() {
        let record = BidRecord::discounted(Bid::from_indices(&[0]), 0.8, 0.5, 1.0);
        assert!((record.discounted_utility - 0.4).abs() < 1e-12);
        let undiscounted = BidRecord::discounted(Bid::from_indices(&[0]), 0.8, 1.0, 0.7);
        assert!((undiscounted.discounted_utility - 0.8).abs() < 1e-12);
    }
}
