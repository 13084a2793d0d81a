//! The combined generator from Press et al., *Numerical Recipes*, 3rd ed.,
//! chapter 7 (`ran.h`'s `Ran` struct). Three 64-bit words of state (`u`, `v`,
//! `w`) are each updated by a different sub-generator (a linear congruential
//! step, a 64-bit xorshift, and a multiply-with-carry step) and combined by
//! XOR; the period is in excess of 3.138 * 10^57.
//!
//! The reference header this was ported from reassigns `v` and `w` to their
//! initial constants at the top of every call, which would make them dead
//! state rather than evolving generators — almost certainly an artifact of
//! how that header was extracted, since `sran` already seeds `v`/`w` to
//! distinct, self-primed values and the surrounding commentary describes a
//! combined generator, not one with two constant sub-streams. This
//! implementation instead evolves `u`, `v`, and `w` on every call, which is
//! both what *Numerical Recipes* specifies and the only reading under which
//! `Ran` is not degenerate.

use rand_core::{Error, RngCore};

const V0: u64 = 4101842887655102017;
const W0: u64 = 1;

/// The Numerical Recipes `Ran` combined generator.
#[derive(Clone)]
pub struct Ran {
    u: u64,
    v: u64,
    w: u64,
}

impl Ran {
    /// Seed a fresh generator (`sran`'s self-priming construction).
    pub fn new(seed: u64) -> Self {
        let mut r = Ran {
            u: seed ^ V0,
            v: V0,
            w: W0,
        };
        r.u = r.next_raw();
        r.v = r.u;
        r.u = r.next_raw();
        r.w = r.v;
        r.u = r.next_raw();
        r
    }

    #[inline]
    fn next_raw(&mut self) -> u64 {
        self.u = self
            .u
            .wrapping_mul(2862933555777941757)
            .wrapping_add(7046029254386353087);
        self.v ^= self.v >> 17;
        self.v ^= self.v << 31;
        self.v ^= self.v >> 8;
        self.w = 4294957665u64
            .wrapping_mul(self.w & 0xFFFF_FFFF)
            .wrapping_add(self.w >> 32);
        let mut x = self.u ^ (self.u << 21);
        x ^= x >> 35;
        x ^= x << 4;
        (x.wrapping_add(self.v)) ^ self.w
    }

    /// Generate the next raw 64-bit word.
    #[inline]
    pub fn rand(&mut self) -> u64 {
        self.next_raw()
    }

    /// Uniform integer in `[0, n)`, `n > 0`.
    #[inline]
    pub fn urand(&mut self, n: u64) -> u64 {
        crate::urand_from(|| self.rand(), n)
    }

    /// Uniform real in `[0, 1]` with a 53-bit fraction.
    #[inline]
    pub fn real1(&mut self) -> f64 {
        (self.rand() >> 11) as f64 * (1.0 / 9007199254740991.0)
    }

    /// Uniform real in `[0, 1)` with a 53-bit fraction.
    #[inline]
    pub fn real2(&mut self) -> f64 {
        (self.rand() >> 11) as f64 * (1.0 / 9007199254740992.0)
    }

    /// Uniform real in `(0, 1)` with a 53-bit fraction.
    #[inline]
    pub fn real3(&mut self) -> f64 {
        ((self.rand() >> 12) as f64 + 0.5) * (1.0 / 4503599627370496.0)
    }
}

impl RngCore for Ran {
    fn next_u32(&mut self) -> u32 {
        (self.rand() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.rand()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproducible_from_seed() {
        let mut a = Ran::new(99);
        let mut b = Ran::new(99);
        for _ in 0..10_000 {
            assert_eq!(a.rand(), b.rand());
        }
    }

    #[test]
    fn state_actually_evolves() {
        let mut r = Ran::new(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(r.rand());
        }
        // A degenerate generator (v, w pinned) would still vary in u, but
        // would repeat far sooner than 1000 draws if u alone cycled back
        // through few distinct combined outputs; practically this just
        // guards against an accidental constant-output regression.
        assert!(seen.len() > 990);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Ran::new(1);
        let mut b = Ran::new(2);
        let seq_a: Vec<u64> = (0..16).map(|_| a.rand()).collect();
        let seq_b: Vec<u64> = (0..16).map(|_| b.rand()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn urand_respects_bound() {
        let mut r = Ran::new(7);
        for _ in 0..100_000 {
            assert!(r.urand(13) < 13);
        }
    }

    #[test]
    fn reals_are_in_expected_intervals() {
        let mut r = Ran::new(5);
        for _ in 0..10_000 {
            let r1 = r.real1();
            assert!((0.0..=1.0).contains(&r1));
            let r2 = r.real2();
            assert!((0.0..1.0).contains(&r2));
            let r3 = r.real3();
            assert!(r3 > 0.0 && r3 < 1.0);
        }
    }
}
