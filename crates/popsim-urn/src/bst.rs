//! The BST urn: a complete binary tree of cumulative left-subtree counts.
//! Ported from `bsturn.c`.
//!
//! The tree is a flat array indexed from 1 (index 0 unused). `cstart` is the
//! index of the first leaf, the smallest power of two `>= ncolors`; leaves
//! live at `cstart..cstart + ncolors` and hold the exact per-color count
//! directly (doubling as both "leaf" and "count cell"). Every internal node
//! `v` holds the sum of the leaf counts in `v`'s left subtree, so a single
//! root-to-leaf walk both locates a sampled marble's color and (for
//! mutation) visits every node whose stored sum needs updating.

use popsim_rng::Mt19937_64;

use crate::{BulkUrn, ColorId, Urn, UrnError};

pub struct BstUrn {
    ncolors: ColorId,
    cstart: usize,
    tree: Vec<u64>,
    nmarbles: u64,
    rng: Mt19937_64,
}

fn next_pow2(n: u32) -> usize {
    if n <= 1 {
        1
    } else {
        1usize << (usize::BITS - (n as usize - 1).leading_zeros())
    }
}

impl BstUrn {
    /// Create an empty BST urn over `ncolors` colors, seeded with `seed`.
    ///
    /// # Errors
    ///
    /// [`UrnError::DomainError`] if `ncolors` is zero or the reserved
    /// sentinel, or [`UrnError::OutOfMemory`] if the tree cannot be
    /// allocated.
    pub fn new(seed: u64, ncolors: ColorId) -> Result<Self, UrnError> {
        if ncolors == 0 || ncolors == ColorId::MAX {
            return Err(UrnError::DomainError);
        }
        let cstart = next_pow2(ncolors);
        let size = 2 * cstart;
        let mut tree = Vec::new();
        tree.try_reserve_exact(size).map_err(|_| UrnError::OutOfMemory)?;
        tree.resize(size, 0);
        Ok(BstUrn {
            ncolors,
            cstart,
            tree,
            nmarbles: 0,
            rng: Mt19937_64::new(seed),
        })
    }

    /// Clone this urn's contents into a fresh urn seeded with `new_seed`.
    pub fn copy(&self, new_seed: u64) -> Self {
        BstUrn {
            ncolors: self.ncolors,
            cstart: self.cstart,
            tree: self.tree.clone(),
            nmarbles: self.nmarbles,
            rng: Mt19937_64::new(new_seed),
        }
    }

    /// Walk from the root to the leaf containing rank `m` (`0 <= m <
    /// nmarbles`), returning its color. At each internal node, `m < left`
    /// goes left, otherwise `m -= left` and go right.
    fn locate(&self, mut m: u64) -> ColorId {
        let mut idx = 1usize;
        while idx < self.cstart {
            let left = self.tree[idx];
            if m < left {
                idx *= 2;
            } else {
                m -= left;
                idx = 2 * idx + 1;
            }
        }
        (idx - self.cstart) as ColorId
    }

    /// Apply `delta` to leaf `c` and to every strict ancestor for which `c`'s
    /// leaf descends through that ancestor's left child — exactly the nodes
    /// [`Self::locate`] would have touched on its way to this leaf.
    fn update(&mut self, c: ColorId, delta: i64) {
        let mut idx = self.cstart + c as usize;
        self.tree[idx] = (self.tree[idx] as i64 + delta) as u64;
        while idx > 1 {
            let parent = idx / 2;
            if idx % 2 == 0 {
                self.tree[parent] = (self.tree[parent] as i64 + delta) as u64;
            }
            idx = parent;
        }
    }
}

impl Urn for BstUrn {
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
        let m = self.rng.urand(self.nmarbles);
        Some(self.locate(m))
    }

    fn draw(&mut self) -> Option<ColorId> {
        if self.nmarbles == 0 {
            return None;
        }
        let m = self.rng.urand(self.nmarbles);
        let c = self.locate(m);
        self.update(c, -1);
        self.nmarbles -= 1;
        Some(c)
    }

    fn cinsert(&mut self, c: ColorId, q: u64) -> Result<(), UrnError> {
        self.update(c, q as i64);
        self.nmarbles += q;
        Ok(())
    }

    fn cdist(&self, c: ColorId) -> u64 {
        self.tree[self.cstart + c as usize]
    }

    fn dist(&self, out: &mut [u64]) {
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = self.tree[self.cstart + c];
        }
    }
}

impl BulkUrn for BstUrn {
    fn cremove(&mut self, c: ColorId, q: u64) -> Result<(), UrnError> {
        if self.cdist(c) < q {
            return Err(UrnError::Underflow);
        }
        self.update(c, -(q as i64));
        self.nmarbles -= q;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_subtree_sum(u: &BstUrn, node: usize) -> u64 {
        // Recompute the expected left-subtree sum for `node` directly from
        // the leaves, independent of the tree's own bookkeeping.
        fn leaves_under(u: &BstUrn, node: usize) -> (usize, usize) {
            let mut lo = node;
            let mut hi = node;
            while lo < u.cstart {
                lo *= 2;
                hi = hi * 2 + 1;
            }
            (lo, hi)
        }
        let left_child = node * 2;
        let (lo, hi) = leaves_under(u, left_child);
        (lo..=hi)
            .filter(|&i| i - u.cstart < u.ncolors as usize)
            .map(|i| u.tree[i])
            .sum()
    }

    #[test]
    fn internal_nodes_equal_left_subtree_sums() {
        let mut u = BstUrn::new(1, 6).unwrap();
        for c in 0..6u32 {
            u.cinsert(c, (c as u64) * 3 + 1).unwrap();
        }
        for node in 1..u.cstart {
            assert_eq!(
                u.tree[node],
                left_subtree_sum(&u, node),
                "node {node} invariant violated"
            );
        }
    }

    #[test]
    fn invariant_holds_after_interleaved_draws_and_inserts() {
        let mut u = BstUrn::new(7, 5).unwrap();
        for c in 0..5u32 {
            u.cinsert(c, 20).unwrap();
        }
        for i in 0..40 {
            if i % 3 == 0 {
                u.cinsert((i % 5) as u32, 2).unwrap();
            } else {
                u.draw();
            }
        }
        for node in 1..u.cstart {
            assert_eq!(u.tree[node], left_subtree_sum(&u, node));
        }
    }

    #[test]
    fn cremove_rejects_underflow_without_mutating() {
        let mut u = BstUrn::new(9, 3).unwrap();
        u.cinsert(1, 4).unwrap();
        assert_eq!(u.cremove(1, 5).unwrap_err(), UrnError::Underflow);
        assert_eq!(u.cdist(1), 4);
    }

    #[test]
    fn single_color_urn_is_degenerate_but_correct() {
        let mut u = BstUrn::new(10, 1).unwrap();
        u.cinsert(0, 7).unwrap();
        assert_eq!(u.sample(), Some(0));
        assert_eq!(u.nmarbles(), 7);
        for _ in 0..7 {
            assert_eq!(u.draw(), Some(0));
        }
        assert!(u.empty());
    }
}
