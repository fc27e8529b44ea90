//! Fixed-point scalar and vector types for the deterministic simulation core.
//!
//! Every quantity the simulation touches (positions, velocities, forces,
//! timesteps) is expressed in these types. No IEEE 754 operation is ever on
//! the hot path, so identical inputs produce bit-identical state on every
//! platform.

mod fixed;
mod vector;

pub use fixed::Fixed;
pub use vector::{FixedVec2, FixedVec3};
