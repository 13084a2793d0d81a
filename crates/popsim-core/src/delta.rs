//! Applying the transition function δ with the "unset transitions are the
//! identity" fallback.

use popsim_pairmap::Delta;
use popsim_urn::ColorId;

/// `δ(s1, s2)`, falling back to the identity `(s1, s2)` when the pair was
/// never inserted into `delta` — states not explicitly mapped map to
/// themselves.
#[inline]
pub fn apply_delta(delta: &dyn Delta, s1: ColorId, s2: ColorId) -> (ColorId, ColorId) {
    delta.lookup(s1, s2).unwrap_or((s1, s2))
}
