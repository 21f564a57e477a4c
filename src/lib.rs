//! Probabilistic data structures for cardinality estimation.
//!
//! This crate estimates the number of *distinct* elements (*cardinality*)
//! of a data stream without storing the elements themselves, trading exact
//! answers for sublinear memory. Two estimators are provided:
//!
//! * [`HyperLogLog`], a probabilistic counter that partitions the hash
//!   space into buckets and tracks per-bucket bit ranks, as described by
//!   P. Flajolet et al. in *HyperLogLog: the analysis of a near-optimal
//!   cardinality estimation algorithm*. Typical accuracy is
//!   `1.04 / sqrt(2`<sup>`precision`</sup>`)` relative standard error.
//! * [`LinearCounter`], a bitmap counter that estimates cardinality from
//!   the fraction of still-unset bits, accurate while occupancy stays a
//!   modest fraction of the bitmap.
//!
//! Both estimators implement the [`Cardinality`] trait and feed items
//! through the same deterministic integer hash ([`hash::hash_i32`]), so
//! estimates are reproducible for a fixed input order. The bit-vector
//! primitive backing the linear counter is exported as [`BitVector`].
//!
//! None of the structures is internally synchronized: callers must
//! serialize mutation, or keep one instance per worker and `merge`
//! afterwards.

#![cfg_attr(feature = "bench-units", feature(test))]

use std::fmt;

mod bitvec;
mod common;
pub mod hash;
mod hyperloglog;
mod linear;

pub use crate::bitvec::BitVector;
pub use crate::hyperloglog::HyperLogLog;
pub use crate::linear::LinearCounter;

/// A trait implemented by every cardinality estimator in this crate.
pub trait Cardinality {
    /// Adds a new item to the multiset.
    fn add(&mut self, item: i32) -> Result<(), SketchError>;
    /// Estimates the cardinality of the multiset.
    fn cardinal(&self) -> Result<f64, SketchError>;
}

#[derive(Debug, PartialEq)]
pub enum SketchError {
    /// Precision for a probabilistic counter outside `[4, 16]`.
    InvalidPrecision,
    /// Merging sketches whose precisions or sizes differ.
    IncompatiblePrecision,
    /// Bit-vector write to a position outside `[0, capacity)`.
    OutOfRange,
    /// Linear counter with no unset bits left; the estimate is
    /// mathematically undefined.
    SaturatedCounter,
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchError::InvalidPrecision => {
                "precision is out of bounds.".fmt(f)
            },
            SketchError::IncompatiblePrecision => {
                "precisions must be equal.".fmt(f)
            },
            SketchError::OutOfRange => {
                "position is out of bounds.".fmt(f)
            },
            SketchError::SaturatedCounter => {
                "counter is saturated.".fmt(f)
            },
        }
    }
}
