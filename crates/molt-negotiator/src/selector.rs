//! Rank-biased stochastic selection.
//!
//! Candidates are grouped into buckets of equal rating. A sample point is
//! drawn on the rating axis with
//!
//! ```text
//! sample = lowest + (highest − lowest) · u^bias,   u ~ U[0, 1)
//! ```
//!
//! where `lowest = min(0, min rating)` and `highest = max rating`. The bucket
//! nearest to the sample wins and ties within a bucket are broken uniformly.
//! A bias below 1 pushes `u^bias` toward 1 and so toward the best ratings.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use tracing::trace;

use crate::config::ReferenceWeights;
use crate::error::{NegotiationError, Result};
use crate::history::BidRecord;
use crate::rating::{ReferenceBids, rate};
use crate::utility::UtilityFunction;

/// Total-ordered rating used as a bucket key.
#[derive(Debug, Clone, Copy)]
struct RatingKey(f64);

impl RatingKey {
    /// `-0.0` and `0.0` map to the same key.
    fn new(rating: f64) -> Self {
        Self(rating + 0.0)
    }
}

impl PartialEq for RatingKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RatingKey {}

impl PartialOrd for RatingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RatingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Samples one candidate, favoring high ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticBidSelector {
    bias: f64,
}

impl StochasticBidSelector {
    /// Creates a selector.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidConfig`] unless `bias` is in `(0, 1]`.
    pub fn new(bias: f64) -> Result<Self> {
        if !bias.is_finite() || bias <= 0.0 || bias > 1.0 {
            return Err(NegotiationError::invalid_config(format!(
                "bias must be in (0, 1], got {bias}"
            )));
        }
        Ok(Self { bias })
    }

    /// Returns the bias exponent.
    #[must_use]
    pub const fn bias(&self) -> f64 {
        self.bias
    }

    /// Picks one of `candidates`, where `ratings[i]` rates `candidates[i]`.
    ///
    /// A single candidate is returned without drawing from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::InvalidInput`] if there are no candidates,
    /// if the lengths differ or if a rating is not finite.
    pub fn select<'a, T, R>(&self, candidates: &'a [T], ratings: &[f64], rng: &mut R) -> Result<&'a T>
    where
        R: Rng + ?Sized,
    {
        if candidates.is_empty() {
            return Err(NegotiationError::invalid_input("no candidates to select from"));
        }
        if candidates.len() != ratings.len() {
            return Err(NegotiationError::invalid_input(format!(
                "{} candidates but {} ratings",
                candidates.len(),
                ratings.len()
            )));
        }
        if let Some(bad) = ratings.iter().find(|r| !r.is_finite()) {
            return Err(NegotiationError::invalid_input(format!(
                "rating must be finite, got {bad}"
            )));
        }
        if let [only] = candidates {
            return Ok(only);
        }

        let mut buckets: BTreeMap<RatingKey, Vec<usize>> = BTreeMap::new();
        for (index, rating) in ratings.iter().enumerate() {
            buckets.entry(RatingKey::new(*rating)).or_default().push(index);
        }

        let highest = ratings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = ratings.iter().copied().fold(0.0, f64::min);
        let u: f64 = rng.gen_range(0.0..1.0);
        let sample = lowest + (highest - lowest) * u.powf(self.bias);

        let key = RatingKey::new(sample);
        let ceiling = buckets.range(key..).next();
        let floor = buckets.range(..=key).next_back();
        let (chosen_key, members) = match (floor, ceiling) {
            (Some((floor_key, floor_members)), Some((ceiling_key, ceiling_members))) => {
                if ceiling_key.0 - sample < sample - floor_key.0 {
                    (ceiling_key, ceiling_members)
                } else {
                    (floor_key, floor_members)
                }
            }
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => {
                return Err(NegotiationError::invalid_input("no rating bucket near sample"));
            }
        };

        let pick = if members.len() == 1 {
            members[0]
        } else {
            members[rng.gen_range(0..members.len())]
        };
        trace!(sample, rating = chosen_key.0, bucket = members.len(), "selected candidate");
        Ok(&candidates[pick])
    }
}

/// Everything needed to rate candidate bids.
#[derive(Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Opponent reference bids.
    pub references: ReferenceBids<'a>,
    /// Issue weights ω, one per issue.
    pub issue_weights: &'a [f64],
    /// Per-value scores of our own preferences.
    pub scorer: &'a dyn UtilityFunction,
}

/// Chooses the bid to offer from candidates above the target utility.
pub trait BidSelector {
    /// Selects one of `candidates`.
    ///
    /// # Errors
    ///
    /// Returns error if `candidates` is empty or cannot be rated.
    fn select_bid<'a>(
        &self,
        candidates: &'a [BidRecord],
        context: &SelectionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<&'a BidRecord>;
}

/// Rates candidates against the reference bids, then samples by rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSelector {
    gamma: ReferenceWeights,
    sampler: StochasticBidSelector,
}

impl RatingSelector {
    /// Creates a rating selector.
    #[must_use]
    pub const fn new(gamma: ReferenceWeights, sampler: StochasticBidSelector) -> Self {
        Self { gamma, sampler }
    }
}

impl BidSelector for RatingSelector {
    fn select_bid<'a>(
        &self,
        candidates: &'a [BidRecord],
        context: &SelectionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<&'a BidRecord> {
        let ratings = candidates
            .iter()
            .map(|record| {
                rate(
                    &record.bid,
                    &context.references,
                    context.issue_weights,
                    &self.gamma,
                    context.scorer,
                )
            })
            .collect::<Result<Vec<f64>>>()?;
        self.sampler.select(candidates, &ratings, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bid, Domain, Issue};
    use crate::utility::AdditiveUtility;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn empty_candidates_rejected() {
        let selector = StochasticBidSelector::new(0.25).unwrap();
        let empty: [u32; 0] = [];
        let result = selector.select(&empty, &[], &mut rng());
        assert!(matches!(result, Err(NegotiationError::InvalidInput { .. })));
    }

    #[test]
    fn length_mismatch_rejected() {
        let selector = StochasticBidSelector::new(0.25).unwrap();
        let result = selector.select(&["a", "b"], &[0.0], &mut rng());
        assert!(matches!(result, Err(NegotiationError::InvalidInput { .. })));
    }

    #[test]
    fn non_finite_rating_rejected() {
        let selector = StochasticBidSelector::new(0.25).unwrap();
        let result = selector.select(&["a", "b"], &[0.0, f64::NAN], &mut rng());
        assert!(matches!(result, Err(NegotiationError::InvalidInput { .. })));
    }

    #[test]
    fn single_candidate_returned_without_sampling() {
        struct PanickingRng;
        impl RngCore for PanickingRng {
            fn next_u32(&mut self) -> u32 {
                panic!("sampler invoked")
            }
            fn next_u64(&mut self) -> u64 {
                panic!("sampler invoked")
            }
            fn fill_bytes(&mut self, _dest: &mut [u8]) {
                panic!("sampler invoked")
            }
            fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
                panic!("sampler invoked")
            }
        }

        let selector = StochasticBidSelector::new(0.25).unwrap();
        let chosen = selector.select(&["only"], &[-3.0], &mut PanickingRng).unwrap();
        assert_eq!(*chosen, "only");
    }

    #[test]
    fn invalid_bias_rejected() {
        assert!(StochasticBidSelector::new(0.0).is_err());
        assert!(StochasticBidSelector::new(1.5).is_err());
        assert!(StochasticBidSelector::new(f64::NAN).is_err());
        assert!(StochasticBidSelector::new(1.0).is_ok());
    }

    #[test]
    fn tiny_bias_picks_dominant_candidate() {
        let selector = StochasticBidSelector::new(1e-6).unwrap();
        let candidates = ["worst", "middle", "best"];
        let ratings = [-1.0, -0.5, 0.0];
        let mut rng = rng();

        for _ in 0..1_000 {
            let chosen = selector.select(&candidates, &ratings, &mut rng).unwrap();
            assert_eq!(*chosen, "best");
        }
    }

    #[test]
    fn unit_bias_samples_the_whole_range() {
        let selector = StochasticBidSelector::new(1.0).unwrap();
        let candidates = ["low", "high"];
        let ratings = [-1.0, 0.0];
        let mut rng = rng();

        let high = (0..1_000)
            .filter(|_| *selector.select(&candidates, &ratings, &mut rng).unwrap() == "high")
            .count();
        assert!(high > 300, "high picked {high} times");
        assert!(high < 700, "high picked {high} times");
    }

    #[test]
    fn lower_bias_favors_high_ratings() {
        let candidates = ["low", "high"];
        let ratings = [-1.0, 0.0];
        let count = |bias: f64| {
            let selector = StochasticBidSelector::new(bias).unwrap();
            let mut rng = rng();
            (0..2_000)
                .filter(|_| *selector.select(&candidates, &ratings, &mut rng).unwrap() == "high")
                .count()
        };
        assert!(count(0.25) > count(1.0));
    }

    #[test]
    fn tied_bucket_is_sampled_uniformly() {
        let selector = StochasticBidSelector::new(1e-6).unwrap();
        let candidates = [0usize, 1, 2];
        let ratings = [-0.2, 0.0, -0.0];
        let mut rng = rng();
        let mut seen = [0usize; 3];

        for _ in 0..1_000 {
            seen[*selector.select(&candidates, &ratings, &mut rng).unwrap()] += 1;
        }
        assert_eq!(seen[0], 0);
        assert!(seen[1] > 350 && seen[2] > 350, "{seen:?}");
    }

    #[test]
    fn positive_ratings_use_only_bracket() {
        // lowest is clamped to 0, so samples below the smallest key still land
        let selector = StochasticBidSelector::new(1.0).unwrap();
        let mut rng = rng();
        for _ in 0..100 {
            let chosen = selector.select(&["a", "b"], &[0.5, 0.6], &mut rng).unwrap();
            assert!(*chosen == "a" || *chosen == "b");
        }
    }

    #[test]
    fn rating_selector_prefers_bids_like_the_opponents() {
        let domain = Domain::new(vec![
            Issue::new("price", ["low", "mid", "high"]),
            Issue::new("delivery", ["slow", "fast"]),
        ])
        .unwrap();
        let utility = AdditiveUtility::new(
            &domain,
            vec![0.5, 0.5],
            vec![vec![0.0, 0.5, 1.0], vec![0.0, 1.0]],
        )
        .unwrap();
        let opponent = Bid::from_indices(&[1, 1]);
        let candidates = vec![
            BidRecord::new(Bid::from_indices(&[2, 1]), 1.0),
            BidRecord::new(Bid::from_indices(&[1, 1]), 0.75),
        ];
        let context = SelectionContext {
            references: ReferenceBids::new(&opponent, &opponent, &opponent),
            issue_weights: &[0.5, 0.5],
            scorer: &utility,
        };
        let selector = RatingSelector::new(
            ReferenceWeights::default(),
            StochasticBidSelector::new(1e-6).unwrap(),
        );

        let chosen = selector.select_bid(&candidates, &context, &mut rng()).unwrap();
        assert_eq!(chosen.bid, opponent);
    }
}
