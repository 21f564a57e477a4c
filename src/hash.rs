//! Deterministic integer hashing shared by the estimators.

// FNV-1a parameters for a 32-bit digest.
const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Hashes a 32-bit integer into a uniformly distributed 32-bit digest.
///
/// Applies FNV-1a over the little-endian byte representation of `x`.
/// The function is pure and carries no per-run seed, so digests (and
/// therefore cardinality estimates) are reproducible across calls and
/// across process restarts.
pub fn hash_i32(x: i32) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;

    for byte in &x.to_le_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    hash
}
