//! Bounded cut pools with trust-based admission for iterative
//! decomposition methods (SDDP, Benders).
//!
//! A [`CutPruner`](pruner::CutPruner) keeps at most `max_cuts` affine
//! cuts of a fixed [`Sense`](cut::Sense), scores them with a pluggable
//! [`TrustModel`](trust::TrustModel) and, as new cuts arrive, decides
//! which incumbents to evict, which candidates to admit and which to
//! reject — with trust ties always resolved against the oldest cut.

pub mod config;
pub mod cut;
pub mod error;
pub mod log;
pub mod pruner;
pub mod redundancy;
pub mod selector;
pub mod territory;
pub mod trust;
pub mod utils;

pub use cut::Sense;
pub use error::PrunerError;
pub use pruner::{
    AvgCutPruner, CutPruner, DecayCutPruner, LevelOneCutPruner,
    DEFAULT_TOLERANCE,
};
pub use territory::LevelOneTrust;
pub use trust::{AverageTrust, DecayTrust, TrustModel};
