//! The batched simulator: coalesces many pairwise interactions into one
//! collision-driven jump, using the multivariate hypergeometric distribution
//! to redistribute which colors participated without tracking individual
//! agent identities.
//!
//! Requires an urn that supports [`BulkUrn::cremove`] and at least 2 agents;
//! implemented generically over any `U: Urn + BulkUrn` so [`crate::BstUrn`]
//! can reuse the same driver if a caller wants to.

use log::trace;
use popsim_math::Collision;
use popsim_pairmap::Delta;
use popsim_rng::Mt19937_64;
use popsim_urn::{BulkUrn, Urn};

use crate::batch_common::{drain_into, redistribute};
use crate::{apply_delta, Distribution, SimError, SnapshotSink};

/// Drives two urns — the live population `u` and a scratch buffer `un` for
/// agents produced mid-batch — through `nsteps` interactions in
/// collision-sized jumps.
pub struct BatchedSimulator<U> {
    u: U,
    un: U,
    ncolors: usize,
    mt: Mt19937_64,
    coll: Collision,
}

impl<U: Urn + BulkUrn> BatchedSimulator<U> {
    /// `un` must be empty; it is the simulator's private scratch buffer and
    /// is always drained back into `u` by the end of every batch.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidArgument`] if `un` is non-empty, the two urns
    /// disagree on `ncolors`, or `u` holds fewer than 2 agents.
    pub fn new(u: U, un: U, seed: u64) -> Result<Self, SimError> {
        if un.nmarbles() != 0 {
            return Err(SimError::InvalidArgument(
                "batched simulator's scratch urn must start empty".into(),
            ));
        }
        if u.ncolors() != un.ncolors() {
            return Err(SimError::InvalidArgument(
                "batched simulator's two urns must share ncolors".into(),
            ));
        }
        let n = u.nmarbles();
        if n < 2 {
            return Err(SimError::InvalidArgument(
                "batched simulator requires at least 2 agents".into(),
            ));
        }
        let ncolors = u.ncolors() as usize;
        let coll = Collision::new(seed, n, 0);
        Ok(BatchedSimulator {
            u,
            un,
            ncolors,
            mt: Mt19937_64::new(seed ^ 0x9E37_79B9_7F4A_7C15),
            coll,
        })
    }

    pub fn into_urn(self) -> U {
        self.u
    }

    /// Run until `nsteps` interactions have elapsed, emitting `nsnap + 1`
    /// rows to `sink`.
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

        let n = self.u.nmarbles() + self.un.nmarbles();
        let mut dist = Distribution::zeros(self.ncolors);
        self.current_dist(&mut dist, n);
        sink.snapshot(0, &dist);

        let cstep = nsteps / nsnap;
        let mut j = 1u64;
        let mut i = 0u64;
        while i < nsteps {
            let advanced = self.batch(delta)?;
            i += advanced;
            i = i.min(nsteps);

            while j < nsnap && i >= j * cstep {
                self.current_dist(&mut dist, n);
                trace!("batched: snapshot row {j} at step {i}");
                sink.snapshot(j as usize, &dist);
                j += 1;
            }
        }

        self.current_dist(&mut dist, n);
        sink.snapshot(nsnap as usize, &dist);
        Ok(())
    }

    fn current_dist(&self, out: &mut Distribution, n: u64) {
        self.u.dist(out);
        out.debug_assert_sums_to(n);
    }

    /// Advance one collision-sized batch, returning the number of elementary
    /// interactions it represents (`L/2 + 1`).
    fn batch(&mut self, delta: &dyn Delta) -> Result<u64, SimError> {
        let l = loop {
            let l = self.coll.sample();
            if l >= 2 {
                break l;
            }
        };
        let half = l / 2;
        let numused = 2 * half;

        redistribute(
            &mut self.u,
            &mut self.un,
            &mut self.mt,
            self.ncolors,
            numused,
            delta,
        )?;

        self.close_collision(delta, l)?;
        Ok(half + 1)
    }

    /// The "+1" closing interaction: the collision event itself, drawing one
    /// endpoint from the still-unmerged scratch buffer and the other from the
    /// live population, then draining whatever is left of `un` into `u`.
    fn close_collision(&mut self, delta: &dyn Delta, l: u64) -> Result<(), SimError> {
        let (p1, q1) = if l % 2 == 0 {
            let p1 = self
                .un
                .draw()
                .ok_or_else(|| SimError::DomainError("scratch buffer unexpectedly empty".into()))?;
            drain_into(&mut self.un, &mut self.u, self.ncolors)?;
            let q1 = self
                .u
                .draw()
                .ok_or_else(|| SimError::DomainError("population unexpectedly empty".into()))?;
            (p1, q1)
        } else {
            let p1 = self
                .u
                .draw()
                .ok_or_else(|| SimError::DomainError("population unexpectedly empty".into()))?;
            let q1 = self
                .un
                .draw()
                .ok_or_else(|| SimError::DomainError("scratch buffer unexpectedly empty".into()))?;
            drain_into(&mut self.un, &mut self.u, self.ncolors)?;
            (p1, q1)
        };
        let (p2, q2) = apply_delta(delta, p1, q1);
        self.u.cinsert(p2, 1)?;
        self.u.cinsert(q2, 1)?;
        debug_assert_eq!(self.un.nmarbles(), 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::VecSink;
    use popsim_pairmap::ArrayPairMap;
    use popsim_urn::LinearUrn;

    #[test]
    fn identity_protocol_holds_every_snapshot() {
        let delta = ArrayPairMap::new(3).unwrap();
        let mut u = LinearUrn::new(1, 3).unwrap();
        u.cinsert(0, 10).unwrap();
        let un = LinearUrn::new(2, 3).unwrap();
        let mut sim = BatchedSimulator::new(u, un, 7).unwrap();
        let mut sink = VecSink::default();
        sim.run(&delta, 1000, 4, &mut sink).unwrap();
        assert_eq!(sink.rows.len(), 5);
        for row in &sink.rows {
            assert_eq!(&row[..], &[10, 0, 0]);
        }
    }

    #[test]
    fn every_snapshot_conserves_population() {
        let mut delta = ArrayPairMap::new(4).unwrap();
        delta.insert(0, 1, 2, 3);
        delta.insert(2, 3, 0, 1);
        let mut u = LinearUrn::new(3, 4).unwrap();
        for c in 0..4u32 {
            u.cinsert(c, 50).unwrap();
        }
        let un = LinearUrn::new(4, 4).unwrap();
        let mut sim = BatchedSimulator::new(u, un, 11).unwrap();
        let mut sink = VecSink::default();
        sim.run(&delta, 20_000, 8, &mut sink).unwrap();
        assert_eq!(sink.rows.len(), 9);
        for row in &sink.rows {
            assert_eq!(row.total(), 200);
        }
    }

    #[test]
    fn rejects_nonempty_scratch_urn() {
        let mut u = LinearUrn::new(1, 2).unwrap();
        u.cinsert(0, 5).unwrap();
        let mut un = LinearUrn::new(2, 2).unwrap();
        un.cinsert(0, 1).unwrap();
        assert!(BatchedSimulator::new(u, un, 1).is_err());
    }
}
