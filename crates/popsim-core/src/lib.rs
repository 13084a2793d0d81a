//! Configuration, snapshotting, and the three simulator drivers that
//! advance a population-protocol urn through its interaction budget.
//!
//! This crate ties together [`popsim_rng`], [`popsim_math`],
//! [`popsim_pairmap`], and [`popsim_urn`] into three simulators:
//!
//! - [`SequentialSimulator`] drives any [`popsim_urn::Urn`] one interaction
//!   at a time.
//! - [`BatchedSimulator`] coalesces many interactions into one
//!   collision-sized jump, backed by an urn that also implements
//!   [`popsim_urn::BulkUrn`].
//! - [`MultiBatchedSimulator`] runs the same idea at the coarser
//!   granularity of adaptive-length epochs, amortizing the redistribution
//!   cost across several collisions.
//!
//! Every driver is generic over its urn type rather than boxed behind a
//! trait object, so the color-sampling hot loop is monomorphized per urn
//! flavor.

mod batch_common;
mod batched;
mod delta;
mod distribution;
mod error;
mod multibatched;
mod sequential;
mod snapshot;

pub use batched::BatchedSimulator;
pub use delta::apply_delta;
pub use distribution::Distribution;
pub use error::SimError;
pub use multibatched::MultiBatchedSimulator;
pub use sequential::SequentialSimulator;
pub use snapshot::{SnapshotSink, VecSink};

pub use popsim_urn::{AliasUrn, ArrayUrn, BstUrn, ColorId, LinearUrn};
