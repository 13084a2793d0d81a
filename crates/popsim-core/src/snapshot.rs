//! [`SnapshotSink`]: the callback every simulator drives once per snapshot
//! row, rather than retaining a whole `(nsnap+1) x nstates` matrix. This
//! lets `popsim-cli` stream rows straight to stdout for large
//! `nstates`/`nsnap` runs.

use crate::Distribution;

/// Receives one snapshot row at a time. `row` is `0..=nsnap`; row 0 is
/// always the initial configuration, row `nsnap` is always the
/// post-`nsteps` configuration.
pub trait SnapshotSink {
    fn snapshot(&mut self, row: usize, dist: &Distribution);
}

impl<F: FnMut(usize, &Distribution)> SnapshotSink for F {
    fn snapshot(&mut self, row: usize, dist: &Distribution) {
        self(row, dist)
    }
}

/// A [`SnapshotSink`] that retains every row, for tests and small runs that
/// want the whole matrix at once.
#[derive(Debug, Default)]
pub struct VecSink {
    pub rows: Vec<Distribution>,
}

impl SnapshotSink for VecSink {
    fn snapshot(&mut self, _row: usize, dist: &Distribution) {
        self.rows.push(dist.clone());
    }
}
