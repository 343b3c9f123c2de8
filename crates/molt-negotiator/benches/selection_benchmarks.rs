//! Benchmarks for molt-negotiator.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use molt_negotiator::{
    AdditiveUtility, Bid, BidRecord, ConcessionConfig, ConcessionInput, ConcessionScheduler,
    Domain, Issue, OutcomeSpace, RankingEstimator, ReferenceBids, ReferenceWeights,
    SortedOutcomeSpace, StochasticBidSelector, UtilityFunction, rate_all,
};

fn domain() -> Domain {
    Domain::new(
        (0..5)
            .map(|i| Issue::new(format!("issue{i}"), (0..6).map(|v| format!("v{v}"))))
            .collect(),
    )
    .unwrap()
}

fn utility(domain: &Domain) -> AdditiveUtility {
    let evaluations = (0..5)
        .map(|_| (0..6).map(|v| f64::from(v) / 5.0).collect())
        .collect();
    AdditiveUtility::new(domain, vec![0.2; 5], evaluations).unwrap()
}

fn benchmark_outcome_space(c: &mut Criterion) {
    let domain = domain();
    let utility = utility(&domain);

    c.bench_function("sorted_outcome_space_7776", |b| {
        b.iter(|| SortedOutcomeSpace::new(black_box(&domain), &utility, 100_000).unwrap());
    });
}

fn benchmark_rating(c: &mut Criterion) {
    let domain = domain();
    let utility = utility(&domain);
    let space = SortedOutcomeSpace::new(&domain, &utility, 100_000).unwrap();
    let candidates: Vec<Bid> = space
        .bids_in_range(0.6, 1.0)
        .into_iter()
        .map(|record| record.bid)
        .collect();
    let reference = Bid::from_indices(&[1, 2, 3, 4, 5]);
    let refs = ReferenceBids::new(&reference, &reference, &reference);

    c.bench_function("rate_candidates_above_0_6", |b| {
        b.iter(|| {
            rate_all(
                black_box(&candidates),
                &refs,
                &[0.2; 5],
                &ReferenceWeights::default(),
                &utility,
            )
            .unwrap()
        });
    });
}

fn benchmark_selection(c: &mut Criterion) {
    let records: Vec<BidRecord> = (0..2_000)
        .map(|i| BidRecord::new(Bid::from_indices(&[i % 6]), 0.5))
        .collect();
    let ratings: Vec<f64> = (0..2_000).map(|i| -f64::from(i % 97) / 97.0).collect();
    let selector = StochasticBidSelector::new(0.25).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("select_from_2000_rated", |b| {
        b.iter(|| {
            let _ = selector.select(black_box(&records), &ratings, &mut rng);
        });
    });
}

fn benchmark_concession(c: &mut Criterion) {
    let scheduler = ConcessionScheduler::new(ConcessionConfig::default()).unwrap();

    c.bench_function("target_utility", |b| {
        b.iter(|| {
            scheduler
                .target_utility(&ConcessionInput::new(black_box(42.0), 100.0, 1.0, 0.4))
                .unwrap()
        });
    });
}

fn benchmark_estimator(c: &mut Criterion) {
    let domain = domain();
    let utility = utility(&domain);
    let mut ranking: Vec<Bid> = domain.enumerate().step_by(7).collect();
    ranking.sort_by(|a, b| utility.utility(a).total_cmp(&utility.utility(b)));

    c.bench_function("ranking_estimator_1111", |b| {
        b.iter(|| RankingEstimator::from_ranking(&domain, black_box(&ranking)).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_outcome_space,
    benchmark_rating,
    benchmark_selection,
    benchmark_concession,
    benchmark_estimator,
);
criterion_main!(benches);
