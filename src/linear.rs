use serde::{Deserialize, Serialize};

use crate::bitvec::BitVector;
use crate::common::EstimatorCommon;
use crate::hash::hash_i32;
use crate::Cardinality;
use crate::SketchError;

/// Implements linear (bitmap) counting for cardinality estimation.
///
/// Each item is hashed to a single bit of an `m`-bit vector and the
/// cardinality is estimated from the fraction of still-unset bits, as
/// described by K.-Y. Whang et al. Bits saturate monotonically: once an
/// item sets a bit, nothing unsets it.
///
/// `m` should be sized so that the expected distinct-item count stays a
/// modest fraction of `m`; accuracy degrades as occupancy approaches the
/// bitmap size, and a fully saturated counter no longer has a defined
/// estimate (see [`cardinal`](Cardinality::cardinal)).
///
/// # Examples
///
/// ```
/// use cardsketch::{Cardinality, LinearCounter};
///
/// let mut counter = LinearCounter::new(8000);
///
/// counter.add(1).unwrap();
/// counter.add(2).unwrap();
/// counter.add(2).unwrap();
///
/// assert_eq!(counter.cardinal(), Ok(2.0));
/// ```
///
/// # References
///
/// - ["A linear-time probabilistic counting algorithm for database
///   applications", Kyu-Young Whang, Brad T. Vander-Zanden and Howard
///   M. Taylor.](https://dl.acm.org/doi/10.1145/78922.78925)
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinearCounter {
    m:    usize,
    bits: BitVector,
}

impl LinearCounter {
    /// Creates a new linear counter over an `m`-bit bitmap.
    ///
    /// # Panics
    ///
    /// Panics if `m` is zero.
    pub fn new(m: usize) -> LinearCounter {
        assert!(m > 0, "bitmap size must be nonzero");

        LinearCounter {
            m:    m,
            bits: BitVector::new(m),
        }
    }

    /// Merges the `other` linear counter into `self`.
    ///
    /// Both counters must have the same bitmap size. The merged bitmap
    /// is the bitwise union, so the result matches a single counter fed
    /// both streams.
    pub fn merge(&mut self, other: &LinearCounter) -> Result<(), SketchError> {
        if self.m != other.m {
            return Err(SketchError::IncompatiblePrecision);
        }

        for pos in other.bits.set_bits() {
            self.bits.set(pos)?;
        }

        Ok(())
    }

    /// Returns the bitmap size `m`.
    pub fn size(&self) -> usize {
        self.m
    }
}

impl EstimatorCommon for LinearCounter {
}

impl Cardinality for LinearCounter {
    /// Adds a new item to the multiset.
    ///
    /// Hashes the item to a bit position in `[0, m)` and sets it. The
    /// position is in range by construction, so the bit-vector write
    /// error it propagates is unreachable in practice.
    fn add(&mut self, item: i32) -> Result<(), SketchError> {
        let pos = hash_i32(item) as usize % self.m;

        if !self.bits.is_set(pos) {
            return self.bits.set(pos);
        }

        Ok(())
    }

    /// Estimates the cardinality of the multiset as
    /// `floor(-m * ln(Z / m))` where `Z` is the number of unset bits.
    ///
    /// Fails with `SaturatedCounter` once every bit is set, where the
    /// formula degenerates to `ln(0)`.
    fn cardinal(&self) -> Result<f64, SketchError> {
        let zeros = self.m - self.bits.count();

        if zeros == 0 {
            return Err(SketchError::SaturatedCounter);
        }

        Ok(Self::linear_count(self.m, zeros).floor())
    }
}
