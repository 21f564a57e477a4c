use serde::{Deserialize, Serialize};

use crate::SketchError;

/// A fixed-capacity vector of single bits.
///
/// Bits are packed into 32-bit words: bit `pos` lives at word
/// `pos / 32`, intra-word offset `pos % 32`, with offset 0 being the
/// least-significant bit of the word. The vector is created once with a
/// fixed capacity, mutated in place and never resized.
///
/// The read and write paths differ deliberately: [`set`] and [`clear`]
/// reject out-of-range positions with [`SketchError::OutOfRange`], while
/// [`is_set`] is total and answers `false` for any out-of-range
/// position. New operations should not extend that asymmetry.
///
/// [`set`]: BitVector::set
/// [`clear`]: BitVector::clear
/// [`is_set`]: BitVector::is_set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BitVector {
    // A buffer containing the bits, packed into u32 words.
    buf:    Vec<u32>,
    // The capacity in bits requested at construction.
    length: usize,
}

impl BitVector {
    // The width of a single storage word (in bits).
    const WORD_BITS: usize = 32;

    /// Creates a new `BitVector` with capacity `length` bits, all clear.
    ///
    /// The backing storage always holds at least one word, even for a
    /// zero capacity, and keeps one word of headroom beyond the last
    /// occupied one.
    pub fn new(length: usize) -> BitVector {
        BitVector {
            buf:    vec![0; length / Self::WORD_BITS + 1],
            length: length,
        }
    }

    /// Sets the bit at position `pos` to 1.
    ///
    /// Fails with `OutOfRange` when `pos >= capacity`, leaving the
    /// vector unchanged. Idempotent.
    pub fn set(&mut self, pos: usize) -> Result<(), SketchError> {
        if pos >= self.length {
            return Err(SketchError::OutOfRange);
        }

        let (word, offset) = Self::locate(pos);

        self.buf[word] |= 1 << offset;

        Ok(())
    }

    /// Clears the bit at position `pos` to 0.
    ///
    /// Same range contract as [`set`](BitVector::set). Idempotent.
    pub fn clear(&mut self, pos: usize) -> Result<(), SketchError> {
        if pos >= self.length {
            return Err(SketchError::OutOfRange);
        }

        let (word, offset) = Self::locate(pos);

        self.buf[word] &= !(1 << offset);

        Ok(())
    }

    /// Returns whether the bit at position `pos` is 1.
    ///
    /// Total over all positions: out-of-range positions answer `false`
    /// rather than an error.
    pub fn is_set(&self, pos: usize) -> bool {
        if pos >= self.length {
            return false;
        }

        let (word, offset) = Self::locate(pos);

        self.buf[word] & (1 << offset) != 0
    }

    /// Returns the number of set bits, by linear scan.
    pub fn count(&self) -> usize {
        (0..self.length).filter(|&pos| self.is_set(pos)).count()
    }

    /// Returns the positions of all set bits, in ascending order.
    pub fn set_bits(&self) -> Vec<usize> {
        (0..self.length).filter(|&pos| self.is_set(pos)).collect()
    }

    /// Returns the capacity (in bits) requested at construction.
    pub fn bit_length(&self) -> usize {
        self.length
    }

    #[inline] // Maps a bit position to its (word, offset) pair.
    fn locate(pos: usize) -> (usize, usize) {
        (pos / Self::WORD_BITS, pos % Self::WORD_BITS)
    }
}
