//! Property tests for bucket partitioning and scoring invariants.

use proptest::prelude::*;

use factorlab_runner::{bucket_sizes, score_factor, FactorStatistics, RatingBand};

proptest! {
    /// Bucket sizes partition the sample exactly, differ by at most one,
    /// and the earliest buckets absorb the remainder.
    #[test]
    fn bucket_sizes_partition_exactly(
        total in 0..5000_usize,
        n_buckets in 1..50_usize,
    ) {
        let sizes = bucket_sizes(total, n_buckets);
        prop_assert_eq!(sizes.len(), n_buckets);
        prop_assert_eq!(sizes.iter().sum::<usize>(), total);

        let max = *sizes.iter().max().unwrap();
        let min = *sizes.iter().min().unwrap();
        prop_assert!(max - min <= 1);

        // Remainder goes to the front: sizes are non-increasing
        for w in sizes.windows(2) {
            prop_assert!(w[0] >= w[1]);
        }
    }

    /// Scoring is total: any combination of finite or NaN inputs produces a
    /// finite composite score and some rating band.
    #[test]
    fn scoring_never_panics_or_overflows(
        ic_mean in prop::option::of(-0.5..0.5_f64),
        ic_std in prop::option::of(0.0..0.5_f64),
        p_value in prop::option::of(0.0..1.0_f64),
        long_short in prop::option::of(-0.2..0.2_f64),
    ) {
        let ic_mean = ic_mean.unwrap_or(f64::NAN);
        let ic_std = ic_std.unwrap_or(f64::NAN);
        let ir = if ic_std > 0.0 { ic_mean / ic_std } else { f64::NAN };

        let mut statistics = FactorStatistics::undefined();
        statistics.ic_mean = ic_mean;
        statistics.ic_std = ic_std;
        statistics.ir = ir;
        statistics.p_value = p_value.unwrap_or(f64::NAN);

        let score = score_factor("factor", &statistics, long_short.unwrap_or(f64::NAN));
        prop_assert!(score.weighted_score.is_finite());
        prop_assert!(score.weighted_score >= 0.0);
        prop_assert!(score.weighted_score <= 4.0);
        // A factor with no measurable IC strength can never reach the A tier
        if !(ic_mean.abs() >= 0.02) {
            prop_assert!(score.rating > RatingBand::AMinus);
        }
    }
}
