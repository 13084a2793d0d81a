use std::fmt;

/// Errors arising from the sampling routines in this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    /// A hypergeometric draw was requested with `sample > total` or
    /// `good > total`.
    InvalidParameters { total: u64, good: u64, sample: u64 },
}

impl fmt::Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathError::InvalidParameters {
                total,
                good,
                sample,
            } => write!(
                f,
                "invalid hypergeometric parameters: total={total}, good={good}, sample={sample}"
            ),
        }
    }
}

impl std::error::Error for MathError {}
