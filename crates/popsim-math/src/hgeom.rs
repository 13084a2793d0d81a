//! Sampling from the (multivariate) hypergeometric distribution, ported
//! algorithm-for-algorithm from `lib/hgeom.c` (itself adapted by the
//! reference implementation from NumPy's `hgeom.c`).

use popsim_rng::Mt19937_64;

use crate::lfac::lfac;

// D1 = 2*sqrt(2/e), D2 = 3 - 2*sqrt(3/e)
const D1: f64 = 1.7155277699214135;
const D2: f64 = 0.8989161620588988;

/// `O(sample)` count-and-decrement hypergeometric sampler, used when
/// `sample` is small relative to `total` (the ratio-of-uniforms rejection
/// scheme in [`hgeom_hrua`] is only efficient away from this boundary).
fn hgeom_sample(mt: &mut Mt19937_64, good: u64, bad: u64, sample: u64) -> u64 {
    let total = good + bad;
    let mut computed_sample = if sample > total / 2 {
        total - sample
    } else {
        sample
    };

    let mut remaining_total = total;
    let mut remaining_good = good;

    while computed_sample > 0 && remaining_good > 0 && remaining_total > remaining_good {
        if mt.urand(remaining_total) < remaining_good {
            remaining_good -= 1;
        }
        remaining_total -= 1;
        computed_sample -= 1;
    }

    if remaining_total == remaining_good {
        remaining_good -= computed_sample;
    }

    if sample > total / 2 {
        remaining_good
    } else {
        good - remaining_good
    }
}

/// HRUA (hypergeometric ratio-of-uniforms-with-acceptance) rejection
/// sampler, used when `sample` is large enough relative to `total` that the
/// `O(sample)` path would be too slow.
fn hgeom_hrua(mt: &mut Mt19937_64, good: u64, bad: u64, sample: u64) -> u64 {
    let popsize = good + bad;
    let computed_sample = sample.min(popsize - sample);
    let mingoodbad = good.min(bad);
    let maxgoodbad = good.max(bad);

    let p = mingoodbad as f64 / popsize as f64;
    let q = maxgoodbad as f64 / popsize as f64;

    let mu = computed_sample as f64 * p;
    let a = mu + 0.5;

    let var = (popsize - computed_sample) as f64 * computed_sample as f64 * p * q
        / (popsize - 1) as f64;

    let c = (var + 0.5).sqrt();
    let h = D1 * c + D2;

    let m = (((computed_sample + 1) as f64 * (mingoodbad + 1) as f64) / (popsize + 2) as f64)
        .floor() as u64;

    let g = lfac(m) + lfac(mingoodbad - m) + lfac(computed_sample - m)
        + lfac(maxgoodbad - computed_sample + m);

    let b = (computed_sample.min(mingoodbad) + 1).min((a + 16.0 * c).floor() as u64);

    let mut k: u64;
    loop {
        let u = mt.real3();
        let v = mt.real3();
        let x = a + h * (v - 0.5) / u;

        if x < 0.0 || x >= b as f64 {
            continue;
        }
        k = x.floor() as u64;

        let gp = lfac(k) + lfac(mingoodbad - k) + lfac(computed_sample - k)
            + lfac(maxgoodbad - computed_sample + k);
        let t = g - gp;

        if u * (4.0 - u) - 3.0 <= t {
            break;
        }
        if u * (u - t) >= 1.0 {
            continue;
        }
        if 2.0 * u.ln() <= t {
            break;
        }
    }

    if good > bad {
        k = computed_sample - k;
    }
    if computed_sample < sample {
        k = good - k;
    }
    k
}

/// Sample from `Hypergeometric(total, good, sample)`: the number of "good"
/// marbles drawn when `sample` marbles are drawn without replacement from an
/// urn of `total` marbles, `good` of which are good.
///
/// Dispatches to the `O(sample)` count-and-decrement algorithm or the HRUA
/// rejection algorithm depending on how `sample` compares to `total`,
/// matching the reference implementation's dispatch rule exactly.
pub fn hgeom(mt: &mut Mt19937_64, total: u64, good: u64, sample: u64) -> u64 {
    if sample >= 10 && sample <= total - 10 {
        hgeom_hrua(mt, good, total - good, sample)
    } else {
        hgeom_sample(mt, good, total - good, sample)
    }
}

/// Sample from the multivariate hypergeometric distribution: draw `sample`
/// marbles without replacement from an urn whose colors are distributed per
/// `srcdist` (`ncolors` entries summing to `total`), writing the number
/// drawn of each color into `destdist`.
///
/// Colors are processed in index order, each via a plain (univariate)
/// hypergeometric draw against the running `total`; the loop exits early
/// once `total` is exhausted, leaving the remaining `destdist` entries
/// untouched (matching `lib/hgeom.c`'s `mhgeom`, including its choice to
/// shrink `total` by the count actually drawn rather than by each color's
/// full size, and to never shrink `sample` across colors).
pub fn mhgeom(
    mt: &mut Mt19937_64,
    destdist: &mut [u64],
    srcdist: &[u64],
    ncolors: usize,
    total: u64,
    sample: u64,
) {
    let mut total = total;
    for c in 0..ncolors {
        let x = hgeom(mt, total, srcdist[c], sample);
        destdist[c] = x;
        total -= x;
        if total == 0 {
            break;
        }
    }
}
