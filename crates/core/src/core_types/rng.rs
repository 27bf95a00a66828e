//! Counter-based pseudo-random generator for forecast synthesis
//!
//! `Mulberry32` is a 32-bit state generator: every draw advances the state by
//! a fixed odd increment and mixes it through two xor-shift/multiply rounds.
//! Given the same seed and the same draw order it reproduces bit-identical
//! sequences, which is what makes a forecast run replayable.
//!
//! The generator also implements [`rand::RngCore`] and [`rand::SeedableRng`]
//! so it can drive `rand` distributions when needed.
//!
//! # Example
//!
//! ```
//! use precip_forecast_core::core_types::{Mulberry32, Seed};
//!
//! let mut rng = Mulberry32::new(Seed::from_key("2025-03-01|3|2015-2024"));
//! let draw = rng.next_f64();
//! assert!((0.0..1.0).contains(&draw));
//! ```

use super::seed::Seed;
use rand::{RngCore, SeedableRng};

/// Weyl-sequence increment added to the state on every draw
const INCREMENT: u32 = 0x6D2B_79F5;

/// Scale from a 32-bit output to `[0, 1)`
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Mulberry32 generator state
///
/// Owned by exactly one synthesis run; never shared between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Create a generator from a derived seed
    #[must_use]
    pub const fn new(seed: Seed) -> Self {
        Self {
            state: seed.value(),
        }
    }

    /// Current internal state (the counter, not the last output)
    #[must_use]
    pub const fn state(&self) -> u32 {
        self.state
    }

    /// Advance the state and return the mixed 32-bit output
    #[inline]
    pub fn next_raw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next draw normalized to `[0, 1)`
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_raw()) / TWO_POW_32
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.next_raw());
        let hi = u64::from(self.next_raw());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(Seed::new(u32::from_le_bytes(seed)))
    }
}
