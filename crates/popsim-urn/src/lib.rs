//! The four interchangeable colored-multiset ("urn") data structures behind
//! the population-protocol simulators in `popsim-core`.
//!
//! Each flavor trades sampling/insertion cost against memory differently:
//!
//! - [`ArrayUrn`] stores one color per agent; O(1) sample via index, O(1)
//!   swap-remove draw, but O(ncolors) to read the whole distribution.
//! - [`LinearUrn`] stores a per-color count; O(ncolors) sample, O(1) insert.
//! - [`BstUrn`] stores cumulative left-subtree counts in a complete binary
//!   tree; O(log ncolors) sample/draw/insert/remove.
//! - [`AliasUrn`] is Vose's alias method with amortized rebuild; O(1)
//!   expected sample via rejection.
//!
//! All four are ported from `popsim`'s `arrurn.c`/`linurn.c`/`bsturn.c`/
//! `aliurn.c`. Every urn owns its own [`popsim_rng::Mt19937_64`] stream,
//! seeded at construction, so two urns never share mutable RNG state.
//!
//! The capability set every flavor supports (`sample`/`draw`/`cinsert`/
//! `cdist`/`dist`/`nmarbles`) is the [`Urn`] trait; the additional bulk/
//! `cremove` operations that only [`LinearUrn`] and [`BstUrn`] support
//! efficiently are the separate [`BulkUrn`] trait, so the type system
//! reflects which flavors can serve the batched simulators (which need
//! `cremove`) rather than panicking at runtime on an unsupported call.

mod alias;
mod array;
mod bst;
mod error;
mod linear;

pub use alias::AliasUrn;
pub use array::ArrayUrn;
pub use bst::BstUrn;
pub use error::UrnError;
pub use linear::LinearUrn;

/// A color (equivalently, agent state) identifier, `0..ncolors`.
pub type ColorId = u32;

/// The capability set every urn flavor supports.
pub trait Urn {
    /// Number of distinct colors this urn was constructed for.
    fn ncolors(&self) -> ColorId;

    /// Current total number of marbles across all colors.
    fn nmarbles(&self) -> u64;

    /// Sample a color without removing it. Returns `None` ("empty") iff
    /// [`Self::nmarbles`] is zero.
    fn sample(&mut self) -> Option<ColorId>;

    /// Sample a color and remove one marble of it. Returns `None` iff
    /// [`Self::nmarbles`] is zero.
    fn draw(&mut self) -> Option<ColorId>;

    /// Insert `q` marbles of color `c`.
    ///
    /// # Errors
    ///
    /// [`UrnError::OutOfMemory`] if growing the backing storage fails.
    fn cinsert(&mut self, c: ColorId, q: u64) -> Result<(), UrnError>;

    /// The exact current count of color `c`.
    fn cdist(&self, c: ColorId) -> u64;

    /// Write the exact current count of every color into `out`
    /// (`out.len() == ncolors()`).
    fn dist(&self, out: &mut [u64]);

    /// `true` iff [`Self::nmarbles`] is zero.
    fn empty(&self) -> bool {
        self.nmarbles() == 0
    }
}

/// The additional per-color removal and whole-distribution bulk operations
/// that [`LinearUrn`] and [`BstUrn`] support in O(1)/O(log ncolors); not
/// implemented by [`ArrayUrn`] or [`AliasUrn`], which can only remove
/// marbles by sampling.
pub trait BulkUrn: Urn {
    /// Remove `q` marbles of color `c`.
    ///
    /// # Errors
    ///
    /// [`UrnError::Underflow`] if the urn holds fewer than `q` marbles of
    /// color `c`.
    fn cremove(&mut self, c: ColorId, q: u64) -> Result<(), UrnError>;

    /// Insert `qs[c]` marbles of color `c` for every `c`.
    fn insert(&mut self, qs: &[u64]) -> Result<(), UrnError> {
        for (c, &q) in qs.iter().enumerate() {
            if q > 0 {
                self.cinsert(c as ColorId, q)?;
            }
        }
        Ok(())
    }

    /// Remove `qs[c]` marbles of color `c` for every `c`.
    ///
    /// # Errors
    ///
    /// [`UrnError::Underflow`] if any color would go negative; no colors are
    /// modified if the check fails partway through (the whole call is
    /// validated against [`Urn::cdist`] before anything is removed).
    fn remove(&mut self, qs: &[u64]) -> Result<(), UrnError> {
        for (c, &q) in qs.iter().enumerate() {
            if q > self.cdist(c as ColorId) {
                return Err(UrnError::Underflow);
            }
        }
        for (c, &q) in qs.iter().enumerate() {
            if q > 0 {
                self.cremove(c as ColorId, q)?;
            }
        }
        Ok(())
    }
}
