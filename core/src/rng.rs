//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the single master seed in the engine config.
//!
//! Each stream is seeded from (master_seed, stable hash of the stream
//! name, frame). This means:
//!   - Registering a new subsystem never changes existing streams.
//!   - Each stream is fully reproducible in isolation.

use crate::types::LogicFrame;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single subsystem and frame.
pub struct SubsystemRng {
    pub name: String,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    pub fn new(master_seed: u64, stream: u64) -> Self {
        let derived_seed = master_seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: "unnamed".to_string(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a float in [lo, hi).
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Hands out RNG streams for a single engine instance.
#[derive(Debug, Clone)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// The stream for `name` at `frame`.
    pub fn for_subsystem(&self, name: &str, frame: LogicFrame) -> SubsystemRng {
        let stream = stable_name_hash(name) ^ frame.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        SubsystemRng::new(self.master_seed, stream).with_name(name)
    }
}

/// FNV-1a. Stable across platforms and compiler versions, unlike
/// `std::hash::DefaultHasher`.
fn stable_name_hash(name: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    name.bytes()
        .fold(OFFSET, |hash, b| (hash ^ b as u64).wrapping_mul(PRIME))
}
