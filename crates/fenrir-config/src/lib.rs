//! Tuning configuration for the simulation core: serde structs with
//! sensible defaults, RON persistence, and the single float→fixed
//! conversion point for hosts that author tuning values as floats.

mod error;
mod tuning;

pub use error::ConfigError;
pub use tuning::{PhysicsTuning, SimTuning, SkeletonTuning};
