//! Biped balance skeleton: a planar Verlet point-mass simulation with
//! human-balance-inspired corrective strategies.
//!
//! The skeleton runs independently of the rigid-body world; the host
//! steps it once per frame and couples it to gameplay through a single
//! pelvis-anchor call. Coordinates are screen-space: y grows downward,
//! the ground plane sits at a positive `ground_y`.

mod bone;
mod joint;
mod skeleton;


pub use bone::Bone;
pub use joint::{Joint, joints};
pub use skeleton::{BalanceSkeleton, FootPositions};
