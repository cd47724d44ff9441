//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each (stream, index)
//! pair. Sub-seeds are derived via BLAKE3 hashing, independently of the
//! order in which they are requested, so serial and parallel execution over
//! the same job list draw identical random streams.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic RNG hierarchy.
///
/// The master seed is expanded into per-(stream, index) sub-seeds using
/// BLAKE3. Because derivation is hash-based rather than order-dependent,
/// the same master seed produces identical sub-seeds regardless of thread
/// scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for one (stream, index) pair.
    pub fn sub_seed(&self, stream: &str, index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&index.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded [`StdRng`] for one (stream, index) pair.
    pub fn rng_for(&self, stream: &str, index: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, index))
    }
}
