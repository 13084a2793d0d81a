//! The collision distribution: given an urn of `n` marbles of which `r` are
//! red, repeatedly draw a marble, replacing every green draw with a red one,
//! until a red marble is drawn; [`Collision::sample`] returns the number of
//! draws this took.
//!
//! This is the birthday-paradox-style distribution used by the batched
//! simulators to coalesce many individual interactions into a single jump:
//! the idea is due to Berenbrink, Hammer, Kaaser, Meyer, Penschuck, and Tran,
//! *Simulating Population Protocols in Sub-Constant Time per Interaction*
//! (2020), arXiv:2005.03584, and this implementation ports `lib/coll.c`
//! algorithm-for-algorithm.

use popsim_rng::Mt19937_64;

use crate::lfac::lfac;

/// Above this many green marbles, [`Collision::sample`] uses
/// [`Collision::regulafalsi`] instead of [`Collision::bisec`] — bisection's
/// `O(log g)` step count is fine either way, but regula falsi converges in
/// fewer iterations once `g` (and thus the search range) is large.
const REGULAFALSI_THRESHOLD: u64 = 1_000_000;

/// State for sampling from the collision distribution. Owns its own RNG
/// stream, independent of whatever generator drives the urn being simulated.
pub struct Collision {
    n: u64,
    r: u64,
    g: u64,
    logn: f64,
    lfacg: f64,
    mt: Mt19937_64,
}

impl Collision {
    /// Create a new collision sampler seeded with `seed`, for an urn of `n`
    /// marbles with `r` red (`r <= n`).
    pub fn new(seed: u64, n: u64, r: u64) -> Self {
        let mut c = Collision {
            n,
            r,
            g: n - r,
            logn: (n as f64).ln(),
            lfacg: 0.0,
            mt: Mt19937_64::new(seed),
        };
        c.lfacg = lfac(c.g + 1);
        c
    }

    /// Update the total number of marbles, keeping the red count fixed.
    pub fn set_n(&mut self, n: u64) {
        self.n = n;
        self.g = n - self.r;
        self.logn = (n as f64).ln();
        self.lfacg = lfac(self.g + 1);
    }

    /// Update the number of red marbles, keeping the total fixed.
    pub fn set_r(&mut self, r: u64) {
        self.r = r;
        self.g = self.n - r;
        self.lfacg = lfac(self.g + 1);
    }

    /// Redefine both the total and red counts.
    pub fn set_n_r(&mut self, n: u64, r: u64) {
        self.n = n;
        self.r = r;
        self.g = n - r;
        self.logn = (n as f64).ln();
        self.lfacg = lfac(self.g + 1);
    }

    fn bisec(&mut self) -> u64 {
        let fixed = self.lfacg - (1.0 - self.mt.real1()).ln();
        let mut lo = if self.r > 0 { 1 } else { 0 };
        let mut hi = self.g;

        while lo + 1 < hi {
            let mi = lo + (hi - lo) / 2;
            let x = (fixed - lfac(self.g - mi)) - mi as f64 * self.logn;
            if x < 0.0 {
                hi = mi;
            } else {
                lo = mi;
            }
        }

        let flo = ((fixed - lfac(self.g - lo)) - lo as f64 * self.logn).abs();
        let fhi = ((fixed - lfac(self.g - hi)) - hi as f64 * self.logn).abs();
        if flo <= fhi {
            lo
        } else {
            hi
        }
    }

    fn regulafalsi(&mut self) -> u64 {
        let fixed = self.lfacg - (1.0 - self.mt.real1()).ln();
        let mut lo = if self.r > 0 { 1 } else { 0 };
        let mut hi = self.g;
        let mut xlo = (fixed - lfac(self.g - lo)) - lo as f64 * self.logn;
        let mut xhi = (fixed - lfac(self.g - hi)) - hi as f64 * self.logn;

        while lo + 1 < hi {
            let mi = ((lo as f64 * xhi - hi as f64 * xlo) / (xhi - xlo)) as u64;
            let x = (fixed - lfac(self.g - mi)) - mi as f64 * self.logn;
            if x < 0.0 {
                hi = mi;
                xhi = x;
            } else {
                lo = mi;
                xlo = x;
            }
        }

        if xlo.abs() <= xhi.abs() {
            lo
        } else {
            hi
        }
    }

    /// Sample from the collision distribution, dispatching between
    /// bisection and regula falsi based on the number of green marbles.
    pub fn sample(&mut self) -> u64 {
        if self.g < REGULAFALSI_THRESHOLD {
            self.bisec()
        } else {
            self.regulafalsi()
        }
    }
}
