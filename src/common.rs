// A trait for sharing numeric helpers between the cardinality
// estimators.
pub(crate) trait EstimatorCommon {
    #[inline] // Returns the harmonic sum `sum(2^-bucket)` over all
              // buckets, along with the count of buckets still at zero.
    fn harmonic_sum<I>(buckets: I) -> (f64, usize)
    where
        I: Iterator<Item = u32>,
    {
        let (mut sum, mut zeros) = (0.0, 0);

        for value in buckets {
            sum += 1.0 / (1u64 << value) as f64;
            zeros += if value == 0 { 1 } else { 0 };
        }

        (sum, zeros)
    }

    #[inline] // Estimates the count of distinct elements using linear
              // counting over a population of `count` slots with
              // `zeros` still unoccupied.
    fn linear_count(count: usize, zeros: usize) -> f64 {
        count as f64 * (count as f64 / zeros as f64).ln()
    }

    #[inline] // Returns the bias correction constant based on the
              // bucket count.
    fn alpha(count: usize) -> f64 {
        match count {
            0..=15 => 0.673,
            16..=31 => 0.697,
            32..=63 => 0.709,
            _ => 0.7213 * count as f64 / (count as f64 + 1.079),
        }
    }

    #[inline] // Returns the number of buckets based on precision.
    fn bucket_count(precision: u8) -> usize {
        1 << precision
    }
}
