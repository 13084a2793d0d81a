//! The array urn: one color per agent, uniform pick plus swap-remove.
//! Ported from `arrurn.c`.

use popsim_rng::Mt19937_64;

use crate::{ColorId, Urn, UrnError};

/// A vector of agent colors of length equal to the current marble count.
pub struct ArrayUrn {
    ncolors: ColorId,
    slots: Vec<ColorId>,
    rng: Mt19937_64,
}

impl ArrayUrn {
    /// Create an empty array urn over `ncolors` colors, seeded with `seed`.
    ///
    /// # Errors
    ///
    /// [`UrnError::DomainError`] if `ncolors == ColorId::MAX` (the reserved
    /// sentinel).
    pub fn new(seed: u64, ncolors: ColorId) -> Result<Self, UrnError> {
        if ncolors == ColorId::MAX {
            return Err(UrnError::DomainError);
        }
        Ok(ArrayUrn {
            ncolors,
            slots: Vec::new(),
            rng: Mt19937_64::new(seed),
        })
    }

    /// Clone this urn's contents into a fresh urn seeded with `new_seed`.
    pub fn copy(&self, new_seed: u64) -> Self {
        ArrayUrn {
            ncolors: self.ncolors,
            slots: self.slots.clone(),
            rng: Mt19937_64::new(new_seed),
        }
    }
}

impl Urn for ArrayUrn {
    fn ncolors(&self) -> ColorId {
        self.ncolors
    }

    fn nmarbles(&self) -> u64 {
        self.slots.len() as u64
    }

    fn sample(&mut self) -> Option<ColorId> {
        if self.slots.is_empty() {
            return None;
        }
        let i = self.rng.urand(self.slots.len() as u64) as usize;
        Some(self.slots[i])
    }

    fn draw(&mut self) -> Option<ColorId> {
        if self.slots.is_empty() {
            return None;
        }
        let i = self.rng.urand(self.slots.len() as u64) as usize;
        let c = self.slots[i];
        let last = self.slots.len() - 1;
        self.slots.swap(i, last);
        self.slots.pop();
        Some(c)
    }

    fn cinsert(&mut self, c: ColorId, q: u64) -> Result<(), UrnError> {
        self.slots
            .try_reserve(q as usize)
            .map_err(|_| UrnError::OutOfMemory)?;
        self.slots.resize(self.slots.len() + q as usize, c);
        Ok(())
    }

    fn cdist(&self, c: ColorId) -> u64 {
        self.slots.iter().filter(|&&x| x == c).count() as u64
    }

    fn dist(&self, out: &mut [u64]) {
        out.fill(0);
        for &c in &self.slots {
            out[c as usize] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sentinel_ncolors() {
        assert_eq!(
            ArrayUrn::new(1, ColorId::MAX).unwrap_err(),
            UrnError::DomainError
        );
    }

    #[test]
    fn empty_sample_and_draw_are_none() {
        let mut u = ArrayUrn::new(1, 3).unwrap();
        assert_eq!(u.sample(), None);
        assert_eq!(u.draw(), None);
        assert!(u.empty());
    }

    #[test]
    fn draw_decrements_nmarbles_by_exactly_one() {
        let mut u = ArrayUrn::new(5, 3).unwrap();
        u.cinsert(0, 2).unwrap();
        u.cinsert(1, 3).unwrap();
        let before = u.nmarbles();
        let c = u.draw().unwrap();
        assert_eq!(u.nmarbles(), before - 1);
        assert_eq!(u.cdist(c), u.cdist(c));
    }

    #[test]
    fn copy_is_independent_of_source() {
        let mut u = ArrayUrn::new(1, 2).unwrap();
        u.cinsert(0, 5).unwrap();
        let mut copy = u.copy(2);
        copy.cinsert(1, 1).unwrap();
        assert_eq!(u.nmarbles(), 5);
        assert_eq!(copy.nmarbles(), 6);
    }
}
