use serde::{Deserialize, Serialize};

use crate::common::EstimatorCommon;
use crate::hash::hash_i32;
use crate::Cardinality;
use crate::SketchError;

/// Implements the HyperLogLog algorithm for cardinality estimation.
///
/// The hash space is partitioned into `2`<sup>`precision`</sup> buckets:
/// the low `precision` bits of an item's hash select the bucket and the
/// remaining bits feed the rank function. Each bucket keeps the maximum
/// rank ever observed, and the estimate combines the bucket maxima
/// through a bias-corrected harmonic mean with small- and large-range
/// corrections, as described in the original paper of P. Flajolet et al.
///
/// Supports insertion-only streams: there is no removal operation and
/// every bucket grows monotonically.
///
/// # Examples
///
/// ```
/// use cardsketch::{Cardinality, HyperLogLog};
///
/// let mut hll = HyperLogLog::new(12).unwrap();
///
/// hll.add(12345).unwrap();
/// hll.add(23456).unwrap();
///
/// assert_eq!(hll.estimate(), 2.0);
/// ```
///
/// # References
///
/// - ["HyperLogLog: the analysis of a near-optimal cardinality estimation
///   algorithm", Philippe Flajolet, Éric Fusy, Olivier Gandouet and
///   Frédéric Meunier.](http://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf)
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HyperLogLog {
    precision: u8,
    count:     usize,
    buckets:   Vec<u8>,
    alpha:     f64,
}

impl HyperLogLog {
    // Minimum precision allowed.
    const MIN_PRECISION: u8 = 4;
    // Maximum precision allowed.
    const MAX_PRECISION: u8 = 16;

    /// Creates a new HyperLogLog instance.
    ///
    /// `precision` selects the memory/accuracy trade-off: the counter
    /// allocates `2`<sup>`precision`</sup> buckets. Fails with
    /// `InvalidPrecision` unless `4 <= precision <= 16`.
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        // Ensure the specified precision is within bounds.
        if precision < Self::MIN_PRECISION || precision > Self::MAX_PRECISION {
            return Err(SketchError::InvalidPrecision);
        }

        // Calculate bucket count based on given precision.
        let count = Self::bucket_count(precision);

        Ok(HyperLogLog {
            precision: precision,
            count:     count,
            buckets:   vec![0; count],
            alpha:     Self::alpha(count),
        })
    }

    /// Estimates the cardinality of the multiset.
    ///
    /// A pure read of the current bucket state, callable any number of
    /// times. Returns `0.0` while no item has been added.
    pub fn estimate(&self) -> f64 {
        let (sum, zeros) = Self::harmonic_sum(
            self.buckets.iter().map(|&value| u32::from(value)),
        );

        if zeros == self.count {
            return 0.0;
        }

        let two32 = (1u64 << 32) as f64;

        let mut raw =
            (self.alpha * (self.count * self.count) as f64 / sum).round();

        if raw <= 2.5 * self.count as f64 && zeros != 0 {
            // Apply small range correction.
            raw = Self::linear_count(self.count, zeros).round();
        } else if raw > two32 / 30.0 {
            // Apply large range correction.
            raw = (-1.0 * two32 * (1.0 - raw / two32).ln()).round();
        }

        raw
    }

    /// Merges the `other` HyperLogLog instance into `self`.
    ///
    /// Both counters must have the same precision. Merging the
    /// per-worker counters of a partitioned stream yields the same
    /// bucket state as feeding the whole stream into one counter.
    pub fn merge(&mut self, other: &HyperLogLog) -> Result<(), SketchError> {
        if self.precision != other.precision {
            return Err(SketchError::IncompatiblePrecision);
        }

        for (cur, &val) in self.buckets.iter_mut().zip(other.buckets.iter()) {
            if val > *cur {
                *cur = val;
            }
        }

        Ok(())
    }

    /// Returns the precision of the counter.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Returns the number of rank buckets.
    pub fn buckets(&self) -> usize {
        self.count
    }

    #[inline] // Returns the rank of a hash remainder: the 1-indexed
              // position of its highest set bit counted from the top of
              // its 32 - precision bit window, saturating at
              // 32 - precision + 1 for a zero remainder.
    fn rank(&self, remainder: u32) -> u32 {
        if remainder == 0 {
            32 - u32::from(self.precision) + 1
        } else {
            1 + (remainder << self.precision).leading_zeros()
        }
    }
}

impl EstimatorCommon for HyperLogLog {
}

impl Cardinality for HyperLogLog {
    /// Adds a new item to the multiset.
    ///
    /// Updates at most one bucket; never fails.
    fn add(&mut self, item: i32) -> Result<(), SketchError> {
        let hash = hash_i32(item);

        // The low `precision` bits select the bucket.
        let index = (hash & (self.count as u32 - 1)) as usize;

        // The remaining bits feed the rank function.
        let rank = self.rank(hash >> self.precision);

        if rank > u32::from(self.buckets[index]) {
            self.buckets[index] = rank as u8;
        }

        Ok(())
    }

    /// Estimates the cardinality of the multiset.
    fn cardinal(&self) -> Result<f64, SketchError> {
        Ok(self.estimate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        assert_eq!(
            HyperLogLog::new(3).unwrap_err(),
            SketchError::InvalidPrecision
        );
        assert_eq!(
            HyperLogLog::new(17).unwrap_err(),
            SketchError::InvalidPrecision
        );

        let hll = HyperLogLog::new(4).unwrap();

        assert_eq!(hll.precision(), 4);
        assert_eq!(hll.buckets(), 16);

        let hll = HyperLogLog::new(16).unwrap();

        assert_eq!(hll.buckets(), 65536);
        assert!((hll.alpha - 0.7213 * 65536.0 / 65537.079).abs() < 1e-12);
    }

    #[test]
    fn test_rank() {
        let hll = HyperLogLog::new(10).unwrap();

        assert_eq!(hll.rank(1), 22);
        assert_eq!(hll.rank(0b100), 20);
        assert_eq!(hll.rank(1 << 21), 1);

        // A zero remainder saturates at 32 - precision + 1.
        assert_eq!(hll.rank(0), 23);

        let hll = HyperLogLog::new(4).unwrap();

        assert_eq!(hll.rank(0), 29);
        assert_eq!(hll.rank(1), 28);
    }

    #[test]
    fn test_add() {
        let mut hll = HyperLogLog::new(10).unwrap();

        // hash_i32(1) == 0xfb69b604: bucket 516, rank 1.
        hll.add(1).unwrap();

        assert_eq!(hll.buckets[516], 1);

        // hash_i32(4) == 0x0ae4f8d1: bucket 209, rank 5.
        hll.add(4).unwrap();

        assert_eq!(hll.buckets[209], 5);

        // Replaying an item leaves the bucket at its maximum.
        hll.add(4).unwrap();

        assert_eq!(hll.buckets[209], 5);

        assert_eq!(hll.buckets.iter().filter(|&&v| v != 0).count(), 2);
    }

    #[test]
    fn test_bucket_monotone() {
        let mut hll = HyperLogLog::new(10).unwrap();

        let mut highest = vec![0u8; hll.buckets()];

        for item in 0..1000 {
            hll.add(item).unwrap();

            for (bucket, max) in hll.buckets.iter().zip(highest.iter_mut()) {
                assert!(*bucket >= *max);
                *max = *bucket;
            }
        }
    }

    #[test]
    fn test_estimate_empty() {
        let hll = HyperLogLog::new(10).unwrap();

        assert_eq!(hll.estimate(), 0.0);
    }

    #[test]
    fn test_estimate_small() {
        let mut hll = HyperLogLog::new(16).unwrap();

        for &item in &[1, 2, 3, 4, 5, 5] {
            hll.add(item).unwrap();
        }

        // Small range correction: 5 distinct items.
        assert_eq!(hll.estimate(), 5.0);

        assert_eq!(hll.cardinal(), Ok(5.0));
    }

    #[test]
    fn test_estimate_replay() {
        let mut hll = HyperLogLog::new(10).unwrap();

        for item in 0..500 {
            hll.add(item).unwrap();
        }

        let before = hll.estimate();
        let buckets = hll.buckets.clone();

        // Re-adding already seen items changes nothing.
        for item in 0..500 {
            hll.add(item).unwrap();
        }

        assert_eq!(hll.estimate(), before);
        assert_eq!(hll.buckets, buckets);
    }

    #[test]
    fn test_merge() {
        let mut first = HyperLogLog::new(12).unwrap();
        let mut second = HyperLogLog::new(12).unwrap();
        let mut whole = HyperLogLog::new(12).unwrap();

        for item in 0..300 {
            first.add(item).unwrap();
            whole.add(item).unwrap();
        }

        for item in 200..600 {
            second.add(item).unwrap();
            whole.add(item).unwrap();
        }

        assert_eq!(first.merge(&second), Ok(()));

        assert_eq!(first.buckets, whole.buckets);
        assert_eq!(first.estimate(), whole.estimate());

        let other = HyperLogLog::new(9).unwrap();

        assert_eq!(
            first.merge(&other),
            Err(SketchError::IncompatiblePrecision)
        );
    }

    #[test]
    fn test_serialization() {
        let mut hll = HyperLogLog::new(16).unwrap();

        for &item in &[1, 2, 3, 4, 5, 5] {
            hll.add(item).unwrap();
        }

        assert_eq!(hll.estimate(), 5.0);

        let serialized = serde_json::to_string(&hll).unwrap();

        let mut deserialized: HyperLogLog =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized.estimate(), 5.0);

        deserialized.add(6).unwrap();

        assert_eq!(deserialized.estimate(), 6.0);
    }

    #[test]
    fn test_accuracy_low_cardinality() {
        use rand::prelude::*;

        let mut rng = rand::thread_rng();

        let mut hll = HyperLogLog::new(10).unwrap();

        // A long stream with only 100 distinct values stays firmly in
        // the linear counting regime.
        for _ in 0..100_000 {
            hll.add(rng.gen_range(0, 100)).unwrap();
        }

        let error = (hll.estimate() - 100.0).abs() / 100.0;

        assert!(error < 0.1, "relative error too high: {}", error);
    }

    #[test]
    fn test_accuracy() {
        use rand::prelude::*;
        use std::collections::HashSet;

        let mut rng = rand::thread_rng();

        let mut hll = HyperLogLog::new(10).unwrap();
        let mut items: HashSet<i32> = HashSet::new();

        for _ in 0..10_000 {
            let item = rng.gen::<i32>();

            items.insert(item);
            hll.add(item).unwrap();
        }

        let cardinality = items.len() as f64;
        let error = (hll.estimate() - cardinality).abs() / cardinality;

        // Theoretical relative standard error for 1024 buckets is
        // 1.04 / sqrt(1024), about 3.25%; allow several deviations.
        assert!(error < 0.15, "relative error too high: {}", error);
    }

    #[cfg(feature = "bench-units")]
    mod benches {
        extern crate test;

        use super::*;
        use test::{black_box, Bencher};

        #[bench]
        fn bench_add(b: &mut Bencher) {
            let mut hll = HyperLogLog::new(16).unwrap();

            b.iter(|| {
                for item in 0..1000 {
                    hll.add(i32::max_value() - item).unwrap();
                }
            })
        }

        #[bench]
        fn bench_estimate(b: &mut Bencher) {
            let mut hll = HyperLogLog::new(16).unwrap();

            for item in 0..10000 {
                hll.add(item).unwrap();
            }

            b.iter(|| {
                let estimate = hll.estimate();
                black_box(estimate);
            })
        }
    }
}
