//! The sequential simulator: one interaction at a time, no batching. Generic
//! over the urn flavor so each of the four urns gets its own monomorphized
//! driver without a `dyn Urn` vtable in the hot loop.

use log::trace;
use popsim_pairmap::Delta;
use popsim_urn::Urn;

use crate::{apply_delta, Distribution, SimError, SnapshotSink};

/// Drives a single urn through `nsteps` pairwise interactions, snapshotting
/// at `nsnap` equidistant points plus the initial configuration.
pub struct SequentialSimulator<U: Urn> {
    urn: U,
}

impl<U: Urn> SequentialSimulator<U> {
    pub fn new(urn: U) -> Self {
        SequentialSimulator { urn }
    }

    /// Consume this simulator, returning the urn it was driving.
    pub fn into_urn(self) -> U {
        self.urn
    }

    /// Run `nsteps` interactions under `delta`, emitting `nsnap + 1` rows to
    /// `sink` (row 0 before any interaction, row `nsnap` after the last).
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidArgument`] if `nsnap` is zero or exceeds `nsteps`.
    pub fn run(
        &mut self,
        delta: &dyn Delta,
        nsteps: u64,
        nsnap: u64,
        sink: &mut impl SnapshotSink,
    ) -> Result<(), SimError> {
        if nsnap == 0 || nsnap > nsteps {
            return Err(SimError::InvalidArgument(format!(
                "nsnap ({nsnap}) must be in [1, nsteps ({nsteps})]"
            )));
        }

        let ncolors = self.urn.ncolors() as usize;
        let n = self.urn.nmarbles();
        let mut dist = Distribution::zeros(ncolors);
        self.urn.dist(&mut dist);
        dist.debug_assert_sums_to(n);
        sink.snapshot(0, &dist);

        let cstep = nsteps / nsnap;
        let mut j = 1u64;
        for i in 1..=nsteps {
            let p1 = self
                .urn
                .draw()
                .ok_or_else(|| SimError::DomainError("urn emptied mid-interaction".into()))?;
            let q1 = self
                .urn
                .draw()
                .ok_or_else(|| SimError::DomainError("urn emptied mid-interaction".into()))?;
            let (p2, q2) = apply_delta(delta, p1, q1);
            self.urn.cinsert(p2, 1)?;
            self.urn.cinsert(q2, 1)?;

            if j < nsnap && i == j * cstep {
                self.urn.dist(&mut dist);
                dist.debug_assert_sums_to(n);
                trace!("sequential: snapshot row {j} at step {i}");
                sink.snapshot(j as usize, &dist);
                j += 1;
            }
        }

        self.urn.dist(&mut dist);
        dist.debug_assert_sums_to(n);
        sink.snapshot(nsnap as usize, &dist);
        Ok(())
    }
}
