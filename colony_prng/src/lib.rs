// Seeded pseudo-random numbers for the colony simulation.
//
// xoshiro256++ (Blackman & Vigna) with its state expanded from a single
// `u64` seed by SplitMix64. The colony only needs a handful of draws
// (waypoint jitter, tie-free sampling in tests), so the surface here is
// small: raw `u64`, unit floats, bounded ranges and a symmetric offset.
//
// The generator is serializable so a host can snapshot it alongside the
// rest of its state and resume the identical stream.
//
// **Critical constraint: determinism.** Same seed, same sequence, on every
// platform. The core step uses only integer arithmetic; floats are derived
// from the top bits of the integer output.

use serde::{Deserialize, Serialize};

/// xoshiro256++ generator. The only source of randomness in the colony.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColonyRng {
    state: [u64; 4],
}

impl ColonyRng {
    /// Seed a generator. Equal seeds produce equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        let state = [
            splitmix64(&mut sm),
            splitmix64(&mut sm),
            splitmix64(&mut sm),
            splitmix64(&mut sm),
        ];
        Self { state }
    }

    /// Advance the generator and return 64 fresh bits.
    pub fn next_u64(&mut self) -> u64 {
        let s = &mut self.state;
        let out = s[0].wrapping_add(s[3]).rotate_left(23).wrapping_add(s[0]);
        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);

        out
    }

    /// Uniform `f32` in [0, 1), built from the top 24 bits.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform `f32` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        assert!(low < high, "range_f32: empty range {low}..{high}");
        low + self.next_f32() * (high - low)
    }

    /// Uniform value in `[-amplitude, amplitude)`. Returns 0 for a
    /// non-positive amplitude so callers can disable jitter through config.
    pub fn symmetric_f32(&mut self, amplitude: f32) -> f32 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.range_f32(-amplitude, amplitude)
    }

    /// Uniform integer in `[low, high)` without modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: empty range {low}..{high}");
        let span = high - low;
        if span.is_power_of_two() {
            return low + (self.next_u64() & (span - 1));
        }
        let zone = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= zone {
                return low + r % span;
            }
        }
    }
}

/// SplitMix64 step, used to expand the seed into the 256-bit state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
