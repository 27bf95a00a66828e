//! Seed derivation for forecast runs
//!
//! A forecast is reproducible because its generator seed is a pure function of
//! the serialized request. The key is hashed with 32-bit FNV-1a over UTF-16
//! code units (not UTF-8 bytes); the two differ only for non-ASCII keys, and
//! the UTF-16 value is the one seeds are published with.

use serde::{Deserialize, Serialize};
use std::fmt;

/// FNV-1a 32-bit offset basis
const FNV_OFFSET_BASIS: u32 = 2166136261;

/// FNV-1a 32-bit prime
const FNV_PRIME: u32 = 16777619;

/// Separator between request fields in the seed key
pub const KEY_SEPARATOR: char = '|';

/// 32-bit generator seed derived from a forecast request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(u32);

impl Seed {
    /// Wrap a raw seed value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Seed(value)
    }

    /// Hash an arbitrary key
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        Seed(fnv1a_utf16(key))
    }

    /// Raw 32-bit value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// FNV-1a over the UTF-16 code units of `key`
///
/// `h * 16777619` under 32-bit wraparound equals
/// `h + (h<<1) + (h<<4) + (h<<7) + (h<<8) + (h<<24)`, which is how the
/// multiplication is usually spelled when only 32-bit shifts are available.
#[must_use]
pub fn fnv1a_utf16(key: &str) -> u32 {
    key.encode_utf16().fold(FNV_OFFSET_BASIS, |h, unit| {
        (h ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift_sum_step(h: u32) -> u32 {
        h.wrapping_add(h << 1)
            .wrapping_add(h << 4)
            .wrapping_add(h << 7)
            .wrapping_add(h << 8)
            .wrapping_add(h << 24)
    }

    #[test]
    fn test_empty_key_is_offset_basis() {
        assert_eq!(fnv1a_utf16(""), 2166136261);
    }

    #[test]
    fn test_reference_values() {
        assert_eq!(fnv1a_utf16("a"), 3826002220);
        assert_eq!(Seed::from_key("2025-03-01|3|2015-2024").value(), 584416806);
        assert_eq!(Seed::from_key("2025-03-01|3|2000-2024").value(), 2475332108);
        assert_eq!(Seed::from_key("2025-06-15|7|2000-2024").value(), 3543233740);
    }

    #[test]
    fn test_shift_sum_identity_matches_multiplication() {
        for h in [0_u32, 1, 0x811c_9dc5, 0xdead_beef, u32::MAX, 584416806] {
            assert_eq!(shift_sum_step(h), h.wrapping_mul(FNV_PRIME));
        }
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Seed::new(255).to_string(), "0x000000ff");
    }
}
