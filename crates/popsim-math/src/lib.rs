//! Log-factorial, (multivariate) hypergeometric sampling, and the collision
//! distribution — the statistical primitives the three simulators in
//! `popsim-core` build on.
//!
//! Everything here is ported from the reference `popsim` implementation's
//! `lfac`, `hgeom.c`, and `coll.c`, adapted to take a `&mut
//! popsim_rng::Mt19937_64` explicitly rather than a process-wide generator.

mod coll;
mod error;
mod hgeom;
mod lfac;

pub use coll::Collision;
pub use error::MathError;
pub use hgeom::{hgeom, mhgeom};
pub use lfac::lfac;

use popsim_rng::Mt19937_64;

/// [`hgeom`], validating that `good <= total` and `sample <= total` first.
pub fn try_hgeom(
    mt: &mut Mt19937_64,
    total: u64,
    good: u64,
    sample: u64,
) -> Result<u64, MathError> {
    if good > total || sample > total {
        return Err(MathError::InvalidParameters {
            total,
            good,
            sample,
        });
    }
    Ok(hgeom(mt, total, good, sample))
}

/// [`mhgeom`], validating that `srcdist` sums to `total` and that `sample <=
/// total`.
pub fn try_mhgeom(
    mt: &mut Mt19937_64,
    destdist: &mut [u64],
    srcdist: &[u64],
    total: u64,
    sample: u64,
) -> Result<(), MathError> {
    let ncolors = srcdist.len();
    if destdist.len() != ncolors {
        return Err(MathError::InvalidParameters {
            total,
            good: ncolors as u64,
            sample,
        });
    }
    if sample > total {
        return Err(MathError::InvalidParameters {
            total,
            good: 0,
            sample,
        });
    }
    mhgeom(mt, destdist, srcdist, ncolors, total, sample);
    Ok(())
}
