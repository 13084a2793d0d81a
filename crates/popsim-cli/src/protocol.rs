//! The stdin wire protocol: a whitespace-delimited description of
//! `nstates`, the initial distribution, and the transition function δ.
//!
//! ```text
//! nstates ndist ntrans
//! s_1:a_1 s_2:a_2 ... s_ndist:a_ndist
//! s_11:s_12 s_13:s_14
//! ...
//! s_ntrans1:s_ntrans2 s_ntrans3:s_ntrans4
//! ```
//!
//! State labels on the wire are 1-based; everything downstream of
//! [`Protocol::read`] uses 0-based [`popsim_urn::ColorId`]s.

use std::io::Read;

use anyhow::{bail, ensure, Context, Result};
use popsim_pairmap::{ArrayPairMap, Delta, HashPairMap};
use popsim_urn::ColorId;

use crate::DeltaRepr;

/// A parsed protocol description: the state count, the initial per-state
/// distribution, and δ in whichever representation `-d` selected.
pub struct Protocol {
    pub nstates: u32,
    pub initial: Vec<u64>,
    pub delta: Box<dyn Delta>,
}

impl Protocol {
    /// Read and validate a protocol description from `reader`, applying the
    /// `nstates` bounds tied to `nsnap` and `delta_repr`.
    ///
    /// # Errors
    ///
    /// Returns an error (mapped to the CLI's `InvalidArgument` exit path) on
    /// any malformed input, an out-of-range state label, or a violated
    /// `nstates` bound.
    pub fn read(mut reader: impl Read, nsnap: u64, delta_repr: DeltaRepr) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("reading protocol description from stdin")?;
        let mut tokens = text.split_whitespace();

        let nstates = next_u64(&mut tokens, "nstates")?;
        let ndist = next_u64(&mut tokens, "ndist")?;
        let ntrans = next_u64(&mut tokens, "ntrans")?;

        ensure!(nstates >= 1, "nstates must be positive, got {nstates}");
        let max_nstates = u64::MAX / (nsnap + 1);
        ensure!(
            nstates <= max_nstates,
            "nstates ({nstates}) exceeds the bound nstates <= (2^64-1)/(nsnap+1) = {max_nstates}"
        );
        if matches!(delta_repr, DeltaRepr::Array) {
            // floor(sqrt(2^64-1)); avoids overflow building an `nstates^2`
            // dense pair-map table.
            let max_array_nstates = 4_294_967_295u64;
            ensure!(
                nstates <= max_array_nstates,
                "nstates ({nstates}) exceeds the array-delta bound {max_array_nstates}"
            );
        }
        let nstates =
            u32::try_from(nstates).context("nstates exceeds the representable state-id range")?;

        let mut initial = vec![0u64; nstates as usize];
        for _ in 0..ndist {
            let tok = tokens
                .next()
                .with_context(|| "unexpected end of input reading the initial distribution")?;
            let (state, count) = parse_pair(tok)?;
            let c = state_to_color(state, nstates)?;
            initial[c as usize] = initial[c as usize]
                .checked_add(count)
                .context("initial distribution count overflowed u64")?;
        }

        let total: u64 = initial.iter().sum();
        ensure!(total >= 2, "total agent count must be >= 2, got {total}");

        let mut delta: Box<dyn Delta> = match delta_repr {
            DeltaRepr::Array => Box::new(ArrayPairMap::new(nstates)?),
            DeltaRepr::Map => Box::new(HashPairMap::new(ntrans.max(1))?),
        };
        let first_writer_wins = matches!(delta_repr, DeltaRepr::Map);
        for _ in 0..ntrans {
            let lhs = tokens
                .next()
                .with_context(|| "unexpected end of input reading a transition")?;
            let rhs = tokens
                .next()
                .with_context(|| "unexpected end of input reading a transition")?;
            let (s1, s2) = parse_pair(lhs)?;
            let (s3, s4) = parse_pair(rhs)?;
            let c1 = state_to_color(s1, nstates)?;
            let c2 = state_to_color(s2, nstates)?;
            let c3 = state_to_color(s3, nstates)?;
            let c4 = state_to_color(s4, nstates)?;
            if first_writer_wins && delta.lookup(c1, c2).is_some() {
                continue;
            }
            delta.insert(c1, c2, c3, c4);
        }

        Ok(Protocol {
            nstates,
            initial,
            delta,
        })
    }
}

fn next_u64<'a>(tokens: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<u64> {
    let tok = tokens
        .next()
        .with_context(|| format!("unexpected end of input reading {what}"))?;
    tok.parse::<u64>()
        .with_context(|| format!("{what} is not a valid non-negative integer: {tok:?}"))
}

/// Split a `"a:b"` token into its two integer halves.
fn parse_pair(tok: &str) -> Result<(u64, u64)> {
    let Some((a, b)) = tok.split_once(':') else {
        bail!("expected \"state:value\", got {tok:?}");
    };
    let a = a
        .parse::<u64>()
        .with_context(|| format!("invalid state label {a:?} in {tok:?}"))?;
    let b = b
        .parse::<u64>()
        .with_context(|| format!("invalid value {b:?} in {tok:?}"))?;
    Ok((a, b))
}

/// Convert a 1-based wire state label to a 0-based [`ColorId`], validating
/// range.
fn state_to_color(state: u64, nstates: u32) -> Result<ColorId> {
    ensure!(
        state >= 1 && state <= nstates as u64,
        "state label {state} out of range [1, {nstates}]"
    );
    Ok((state - 1) as ColorId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identity_protocol() {
        let input = "3 1 0\n1:10\n";
        let p = Protocol::read(input.as_bytes(), 1, DeltaRepr::Array).unwrap();
        assert_eq!(p.nstates, 3);
        assert_eq!(p.initial, vec![10, 0, 0]);
    }

    #[test]
    fn sums_duplicate_distribution_entries() {
        let input = "2 3 0\n1:3 1:4 2:3\n";
        let p = Protocol::read(input.as_bytes(), 1, DeltaRepr::Array).unwrap();
        assert_eq!(p.initial, vec![7, 3]);
    }

    #[test]
    fn array_delta_last_writer_wins() {
        let input = "2 2 2\n1:1 2:1\n1:2 1:1\n1:2 2:2\n";
        let p = Protocol::read(input.as_bytes(), 1, DeltaRepr::Array).unwrap();
        assert_eq!(p.delta.lookup(0, 1), Some((1, 1)));
    }

    #[test]
    fn map_delta_first_writer_wins() {
        let input = "2 2 2\n1:1 2:1\n1:2 1:1\n1:2 2:2\n";
        let p = Protocol::read(input.as_bytes(), 1, DeltaRepr::Map).unwrap();
        assert_eq!(p.delta.lookup(0, 1), Some((0, 0)));
    }

    #[test]
    fn rejects_out_of_range_state_label() {
        let input = "2 1 0\n3:1\n";
        assert!(Protocol::read(input.as_bytes(), 1, DeltaRepr::Array).is_err());
    }

    #[test]
    fn rejects_population_below_two() {
        let input = "2 1 0\n1:1\n";
        assert!(Protocol::read(input.as_bytes(), 1, DeltaRepr::Array).is_err());
    }

    #[test]
    fn unset_transitions_default_to_identity() {
        let input = "2 2 0\n1:1 2:1\n";
        let p = Protocol::read(input.as_bytes(), 1, DeltaRepr::Array).unwrap();
        assert_eq!(p.delta.lookup(0, 1), None);
    }
}
