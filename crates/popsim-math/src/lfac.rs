//! Natural log of the factorial function, `lfac(n) = ln(n!)`.
//!
//! Exact for small `n` via a precomputed cumulative-sum table; for larger
//! `n` via the Stirling asymptotic series, which converges to full `f64`
//! precision well before the table's upper bound is reached.

use std::sync::OnceLock;

const TABLE_LEN: usize = 257;

fn table() -> &'static [f64; TABLE_LEN] {
    static TABLE: OnceLock<[f64; TABLE_LEN]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [0.0f64; TABLE_LEN];
        let mut acc = 0.0f64;
        for (n, slot) in t.iter_mut().enumerate().skip(1) {
            acc += (n as f64).ln();
            *slot = acc;
        }
        t
    })
}

// Coefficients of the Stirling series correction 1/(12n) - 1/(360n^3) +
// 1/(1260n^5) - 1/(1680n^7), the standard four-term expansion used by most
// log-gamma implementations (e.g. `lgamma` in glibc, NumPy's `loggam`).
const C1: f64 = 1.0 / 12.0;
const C3: f64 = 1.0 / 360.0;
const C5: f64 = 1.0 / 1260.0;
const C7: f64 = 1.0 / 1680.0;

fn stirling(n: u64) -> f64 {
    let n = n as f64;
    let inv_n = 1.0 / n;
    let inv_n2 = inv_n * inv_n;
    let series = inv_n * (C1 - inv_n2 * (C3 - inv_n2 * (C5 - inv_n2 * C7)));
    n * n.ln() - n + 0.5 * (std::f64::consts::TAU * n).ln() + series
}

/// `ln(n!)`.
pub fn lfac(n: u64) -> f64 {
    let table = table();
    if (n as usize) < TABLE_LEN {
        return table[n as usize];
    }
    stirling(n)
}
