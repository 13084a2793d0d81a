//! The linear urn: a per-color count vector, sampled by linear scan.
//! Ported from `linurn.c`.

use popsim_rng::Mt19937_64;

use crate::{BulkUrn, ColorId, Urn, UrnError};

/// A vector of per-color counts of length `ncolors`.
pub struct LinearUrn {
    counts: Vec<u64>,
    nmarbles: u64,
    rng: Mt19937_64,
}

impl LinearUrn {
    /// Create an empty linear urn over `ncolors` colors, seeded with `seed`.
    ///
    /// # Errors
    ///
    /// [`UrnError::DomainError`] if `ncolors == ColorId::MAX`, or
    /// [`UrnError::OutOfMemory`] if the count vector cannot be allocated.
    pub fn new(seed: u64, ncolors: ColorId) -> Result<Self, UrnError> {
        if ncolors == ColorId::MAX {
            return Err(UrnError::DomainError);
        }
        let mut counts = Vec::new();
        counts
            .try_reserve_exact(ncolors as usize)
            .map_err(|_| UrnError::OutOfMemory)?;
        counts.resize(ncolors as usize, 0);
        Ok(LinearUrn {
            counts,
            nmarbles: 0,
            rng: Mt19937_64::new(seed),
        })
    }

    /// Clone this urn's contents into a fresh urn seeded with `new_seed`.
    pub fn copy(&self, new_seed: u64) -> Self {
        LinearUrn {
            counts: self.counts.clone(),
            nmarbles: self.nmarbles,
            rng: Mt19937_64::new(new_seed),
        }
    }
}

impl Urn for LinearUrn {
    fn ncolors(&self) -> ColorId {
        self.counts.len() as ColorId
    }

    fn nmarbles(&self) -> u64 {
        self.nmarbles
    }

    fn sample(&mut self) -> Option<ColorId> {
        if self.nmarbles == 0 {
            return None;
        }
        let mut m = self.rng.urand(self.nmarbles);
        for (c, &count) in self.counts.iter().enumerate() {
            if m < count {
                return Some(c as ColorId);
            }
            m -= count;
        }
        unreachable!("urand(nmarbles) must land within the counted colors");
    }

    fn draw(&mut self) -> Option<ColorId> {
        if self.nmarbles == 0 {
            return None;
        }
        let mut m = self.rng.urand(self.nmarbles);
        for (c, count) in self.counts.iter_mut().enumerate() {
            if m < *count {
                *count -= 1;
                self.nmarbles -= 1;
                return Some(c as ColorId);
            }
            m -= *count;
        }
        unreachable!("urand(nmarbles) must land within the counted colors");
    }

    fn cinsert(&mut self, c: ColorId, q: u64) -> Result<(), UrnError> {
        self.counts[c as usize] += q;
        self.nmarbles += q;
        Ok(())
    }

    fn cdist(&self, c: ColorId) -> u64 {
        self.counts[c as usize]
    }

    fn dist(&self, out: &mut [u64]) {
        out.copy_from_slice(&self.counts);
    }
}

impl BulkUrn for LinearUrn {
    fn cremove(&mut self, c: ColorId, q: u64) -> Result<(), UrnError> {
        let cell = &mut self.counts[c as usize];
        if *cell < q {
            return Err(UrnError::Underflow);
        }
        *cell -= q;
        self.nmarbles -= q;
        Ok(())
    }
}
