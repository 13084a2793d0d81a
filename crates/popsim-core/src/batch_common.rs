//! Shared machinery between the batched and multi-batched simulators:
//! redistributing a block of "accounted for" agents from `u` back out
//! through δ via multivariate hypergeometric splitting, and draining a
//! scratch urn back into the live population.

use popsim_math::try_mhgeom;
use popsim_pairmap::Delta;
use popsim_rng::Mt19937_64;
use popsim_urn::{BulkUrn, ColorId, Urn};

use crate::{apply_delta, SimError};

/// Remove `numused` agents from `u` (distributed across colors by
/// `mhgeom`), split them into `numused/2` initiator/responder pairs (again
/// by `mhgeom`), apply `delta` once per distinct `(p1, q1)` color pair, and
/// insert the resulting outputs into `un`.
///
/// This is the bulk redistribution step common to one batched-simulator
/// "batch" (§4.8 step 2) and one multi-batched-simulator epoch's
/// end-of-epoch settlement (§4.9).
pub(crate) fn redistribute<U: Urn + BulkUrn>(
    u: &mut U,
    un: &mut U,
    mt: &mut Mt19937_64,
    ncolors: usize,
    numused: u64,
    delta: &dyn Delta,
) -> Result<(), SimError> {
    if numused == 0 {
        return Ok(());
    }
    let half = numused / 2;

    let mut udist = vec![0u64; ncolors];
    u.dist(&mut udist);
    let mut ic = vec![0u64; ncolors];
    try_mhgeom(mt, &mut ic, &udist, u.nmarbles(), numused)?;
    for c in 0..ncolors {
        if ic[c] > 0 {
            u.cremove(c as ColorId, ic[c])?;
        }
    }

    let mut initiators = vec![0u64; ncolors];
    try_mhgeom(mt, &mut initiators, &ic, numused, half)?;
    let mut responders: Vec<u64> = ic
        .iter()
        .zip(initiators.iter())
        .map(|(&total, &init)| total - init)
        .collect();
    let mut responders_left = numused - half;

    for p1 in 0..ncolors {
        let n_init = initiators[p1];
        if n_init == 0 {
            continue;
        }
        let mut rc = vec![0u64; ncolors];
        try_mhgeom(mt, &mut rc, &responders, responders_left, n_init)?;
        for q1 in 0..ncolors {
            if rc[q1] == 0 {
                continue;
            }
            let (p2, q2) = apply_delta(delta, p1 as ColorId, q1 as ColorId);
            un.cinsert(p2, rc[q1])?;
            un.cinsert(q2, rc[q1])?;
            responders[q1] -= rc[q1];
        }
        responders_left -= n_init;
    }

    Ok(())
}

/// Move every marble currently in `src` into `dst`, leaving `src` empty.
pub(crate) fn drain_into<U: Urn + BulkUrn>(
    src: &mut U,
    dst: &mut U,
    ncolors: usize,
) -> Result<(), SimError> {
    if src.nmarbles() == 0 {
        return Ok(());
    }
    let mut d = vec![0u64; ncolors];
    src.dist(&mut d);
    dst.insert(&d)?;
    src.remove(&d)?;
    Ok(())
}
