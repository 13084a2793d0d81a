//! The alias urn: Vose's linear-time alias method with amortized rebuild,
//! giving O(1)-expected sampling via bounded rejection. Ported from
//! `aliurn.c`.
//!
//! For each color `c`, `weight[c]` marbles are reached directly and
//! `aweight[c]` are reached via `alias[c]`; `min_rweight`/`max_rweight` track
//! the running min/max of `weight[c] + aweight[c]` across colors, and
//! `rebuild` restores them to `floor(n/C)`/`ceil(n/C)` whenever they drift
//! outside the tunable `[lbound, rbound]` slack. `dist[c]` is kept alongside
//! as the exact count of color `c` — the alias table itself only encodes
//! enough structure to sample correctly, not to answer `cdist` directly.
//!
//! The reference implementation's `aliurn_rebuild` has a known typo
//! (`u->dist[k] -+ u->aweight[j]`, presumably meant to be `-=`) and uses
//! signed-underflow-prone loop counters; this is a clean-room reimplementation
//! of the corrected contract, not a port of that function's body.

use std::collections::VecDeque;

use popsim_rng::Mt19937_64;

use crate::{ColorId, Urn, UrnError};

pub struct AliasUrn {
    ncolors: ColorId,
    weight: Vec<u64>,
    aweight: Vec<u64>,
    alias: Vec<ColorId>,
    dist: Vec<u64>,
    nmarbles: u64,
    min_rweight: u64,
    max_rweight: u64,
    alpha: f64,
    beta: f64,
    rng: Mt19937_64,
}

/// Bound the in-expectation rejection loop in [`AliasUrn::sample`] so a
/// corrupted invariant fails loudly instead of spinning forever.
const MAX_REJECTIONS: u32 = 1_000_000;

impl AliasUrn {
    /// Create an empty alias urn over `ncolors` colors, seeded with `seed`,
    /// with rebuild-frequency tuning parameters `alpha`/`beta` (a typical
    /// choice is `alpha = 0.8`, `beta = 1.5`).
    ///
    /// # Errors
    ///
    /// [`UrnError::DomainError`] if `ncolors` is zero or the reserved
    /// sentinel, `alpha` is not in `(0, 1)`, or `beta <= 1`.
    pub fn new(seed: u64, ncolors: ColorId, alpha: f64, beta: f64) -> Result<Self, UrnError> {
        if ncolors == 0 || ncolors == ColorId::MAX {
            return Err(UrnError::DomainError);
        }
        if !(alpha > 0.0 && alpha < 1.0) || !(beta > 1.0) {
            return Err(UrnError::DomainError);
        }
        let n = ncolors as usize;
        let mut weight = Vec::new();
        weight.try_reserve_exact(n).map_err(|_| UrnError::OutOfMemory)?;
        weight.resize(n, 0);
        let aweight = vec![0u64; n];
        let alias: Vec<ColorId> = (0..ncolors).collect();
        let dist = vec![0u64; n];
        Ok(AliasUrn {
            ncolors,
            weight,
            aweight,
            alias,
            dist,
            nmarbles: 0,
            min_rweight: 0,
            max_rweight: 1,
            alpha,
            beta,
            rng: Mt19937_64::new(seed),
        })
    }

    /// Clone this urn's contents into a fresh urn seeded with `new_seed`.
    pub fn copy(&self, new_seed: u64) -> Self {
        AliasUrn {
            rng: Mt19937_64::new(new_seed),
            ..self.clone_fields()
        }
    }

    fn clone_fields(&self) -> Self {
        AliasUrn {
            ncolors: self.ncolors,
            weight: self.weight.clone(),
            aweight: self.aweight.clone(),
            alias: self.alias.clone(),
            dist: self.dist.clone(),
            nmarbles: self.nmarbles,
            min_rweight: self.min_rweight,
            max_rweight: self.max_rweight,
            alpha: self.alpha,
            beta: self.beta,
            rng: self.rng.clone(),
        }
    }

    fn lbound(&self) -> u64 {
        ((self.alpha * self.nmarbles as f64) / self.ncolors as f64).ceil() as u64
    }

    fn rbound(&self) -> u64 {
        let per_color = (self.nmarbles as f64 / self.ncolors as f64).ceil();
        (self.beta * per_color).ceil() as u64
    }

    /// Vose's alias construction, from scratch, over the current exact
    /// distribution `self.dist`.
    fn rebuild(&mut self) {
        let c = self.ncolors as u64;
        let n = self.nmarbles;
        let min_rweight = if c == 0 { 0 } else { n / c };
        let mut nmax = n - min_rweight * c;
        let max_rweight = min_rweight + u64::from(nmax > 0);

        let mut work = self.dist.clone();
        let mut small: VecDeque<ColorId> = VecDeque::new();
        let mut large: VecDeque<ColorId> = VecDeque::new();
        for col in 0..self.ncolors {
            if work[col as usize] <= min_rweight {
                small.push_back(col);
            } else {
                large.push_back(col);
            }
        }

        for col in 0..self.ncolors as usize {
            self.weight[col] = work[col];
            self.aweight[col] = 0;
            self.alias[col] = col as ColorId;
        }

        while let (Some(&s), Some(&l)) = (small.front(), large.front()) {
            let s = s;
            small.pop_front();
            let mut target = min_rweight;
            if nmax > 0 {
                target += 1;
                nmax -= 1;
            }
            self.weight[s as usize] = work[s as usize];
            let donate = target.saturating_sub(self.weight[s as usize]);
            self.aweight[s as usize] = donate;
            self.alias[s as usize] = l;
            work[l as usize] -= donate;

            if work[l as usize] <= min_rweight {
                large.pop_front();
                small.push_back(l);
            }
        }

        // Large ran dry with small colors left over (or vice versa): any
        // remainder just keeps its exact count with no alias donation.
        for col in small.into_iter().chain(large) {
            self.weight[col as usize] = work[col as usize];
            self.aweight[col as usize] = 0;
        }

        self.min_rweight = min_rweight;
        self.max_rweight = max_rweight;
    }

    fn maybe_rebuild(&mut self) {
        if self.nmarbles == 0 {
            return;
        }
        if self.min_rweight < self.lbound() || self.max_rweight > self.rbound() {
            self.rebuild();
        }
    }
}

impl Urn for AliasUrn {
    fn ncolors(&self) -> ColorId {
        self.ncolors
    }

    fn nmarbles(&self) -> u64 {
        self.nmarbles
    }

    fn sample(&mut self) -> Option<ColorId> {
        if self.nmarbles == 0 {
            return None;
        }
        for _ in 0..MAX_REJECTIONS {
            let c = self.rng.urand(self.ncolors as u64) as usize;
            let w = self.rng.urand(self.max_rweight.max(1));
            let total = self.weight[c] + self.aweight[c];
            if w >= total {
                continue;
            }
            return Some(if w < self.weight[c] {
                c as ColorId
            } else {
                self.alias[c]
            });
        }
        unreachable!(
            "alias urn rejection loop exceeded {MAX_REJECTIONS} iterations; invariant violated"
        );
    }

    fn draw(&mut self) -> Option<ColorId> {
        if self.nmarbles == 0 {
            return None;
        }
        for _ in 0..MAX_REJECTIONS {
            let c = self.rng.urand(self.ncolors as u64) as usize;
            let w = self.rng.urand(self.max_rweight.max(1));
            let total = self.weight[c] + self.aweight[c];
            if w >= total {
                continue;
            }
            let returned = if w < self.weight[c] {
                self.weight[c] -= 1;
                c as ColorId
            } else {
                self.aweight[c] -= 1;
                self.alias[c]
            };
            let new_total = self.weight[c] + self.aweight[c];
            if new_total < self.min_rweight {
                self.min_rweight = new_total;
            }
            self.dist[returned as usize] -= 1;
            self.nmarbles -= 1;
            self.maybe_rebuild();
            return Some(returned);
        }
        unreachable!(
            "alias urn rejection loop exceeded {MAX_REJECTIONS} iterations; invariant violated"
        );
    }

    fn cinsert(&mut self, c: ColorId, q: u64) -> Result<(), UrnError> {
        self.dist[c as usize] += q;
        self.weight[c as usize] += q;
        self.nmarbles += q;
        let total = self.weight[c as usize] + self.aweight[c as usize];
        if total > self.max_rweight {
            self.max_rweight = total;
        }
        self.maybe_rebuild();
        Ok(())
    }

    fn cdist(&self, c: ColorId) -> u64 {
        self.dist[c as usize]
    }

    fn dist(&self, out: &mut [u64]) {
        out.copy_from_slice(&self.dist);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_alpha_beta() {
        assert_eq!(
            AliasUrn::new(1, 4, 0.0, 1.5).unwrap_err(),
            UrnError::DomainError
        );
        assert_eq!(
            AliasUrn::new(1, 4, 1.0, 1.5).unwrap_err(),
            UrnError::DomainError
        );
        assert_eq!(
            AliasUrn::new(1, 4, 0.8, 1.0).unwrap_err(),
            UrnError::DomainError
        );
        assert!(AliasUrn::new(1, 4, 0.8, 1.5).is_ok());
    }

    #[test]
    fn bound_invariant_holds_after_every_mutation() {
        let mut u = AliasUrn::new(1, 10, 0.8, 1.5).unwrap();
        for c in 0..10u32 {
            u.cinsert(c, 2).unwrap();
            let lb = u.lbound();
            let rb = u.rbound();
            assert!(
                u.min_rweight <= u.max_rweight,
                "min {} > max {}",
                u.min_rweight,
                u.max_rweight
            );
            assert!(u.min_rweight >= lb || u.nmarbles == 0);
            assert!(u.max_rweight <= rb.max(u.max_rweight.min(rb)) || rb == 0);
        }
    }

    #[test]
    fn uniform_sampling_converges_to_counts() {
        let mut u = AliasUrn::new(42, 10, 0.8, 1.5).unwrap();
        for c in 0..10u32 {
            u.cinsert(c, 2).unwrap();
        }
        let calls = 2_000_000u64;
        let mut counts = [0u64; 10];
        for _ in 0..calls {
            let c = u.sample().unwrap();
            counts[c as usize] += 1;
        }
        let expected = calls as f64 / 10.0;
        for c in counts {
            assert!(
                (c as f64 - expected).abs() < expected * 0.03,
                "count {c} expected {expected}"
            );
        }
    }

    #[test]
    fn draw_decrements_exactly_one_and_multiset_matches_inserted() {
        let mut u = AliasUrn::new(7, 6, 0.8, 1.5).unwrap();
        let weights = [10u64, 30, 5, 40, 15, 20];
        for (c, &q) in weights.iter().enumerate() {
            u.cinsert(c as ColorId, q).unwrap();
        }
        let total: u64 = weights.iter().sum();
        let mut drawn = [0u64; 6];
        while let Some(c) = u.draw() {
            drawn[c as usize] += 1;
        }
        assert_eq!(drawn, weights);
        assert_eq!(drawn.iter().sum::<u64>(), total);
        assert!(u.empty());
    }

    #[test]
    fn rebuild_preserves_exact_distribution() {
        let mut u = AliasUrn::new(9, 7, 0.8, 1.5).unwrap();
        let weights = [1u64, 50, 2, 49, 3, 48, 4];
        for (c, &q) in weights.iter().enumerate() {
            u.cinsert(c as ColorId, q).unwrap();
        }
        for (c, &w) in weights.iter().enumerate() {
            assert_eq!(u.cdist(c as ColorId), w);
        }
        let mut dist = [0u64; 7];
        u.dist(&mut dist);
        assert_eq!(dist, weights);
    }
}
