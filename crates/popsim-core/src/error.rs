use std::fmt;

use popsim_math::MathError;
use popsim_pairmap::PairMapError;
use popsim_urn::UrnError;

/// Errors surfaced by the configuration, snapshotting, and simulator layer.
///
/// An "empty urn" condition is not a variant here: urn `sample`/`draw`
/// already surface it as `Option::None`, which the simulators handle inline
/// rather than by allocating an error for a condition every call already
/// expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Malformed construction input: a negative/overflowing count, a
    /// `nsnap` outside `[1, nsteps]`, or similar.
    InvalidArgument(String),

    /// A constructor precondition of an underlying urn or pair map was
    /// violated.
    DomainError(String),

    /// Allocation failed while sizing a simulator's backing storage.
    OutOfMemory,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            SimError::DomainError(msg) => write!(f, "domain error: {msg}"),
            SimError::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<UrnError> for SimError {
    fn from(e: UrnError) -> Self {
        match e {
            UrnError::OutOfMemory => SimError::OutOfMemory,
            UrnError::DomainError => SimError::DomainError(e.to_string()),
            UrnError::Underflow => SimError::DomainError(e.to_string()),
        }
    }
}

impl From<PairMapError> for SimError {
    fn from(e: PairMapError) -> Self {
        match e {
            PairMapError::OutOfMemory => SimError::OutOfMemory,
            PairMapError::DomainError => SimError::DomainError(e.to_string()),
        }
    }
}

impl From<MathError> for SimError {
    fn from(e: MathError) -> Self {
        SimError::DomainError(e.to_string())
    }
}
