//! Bone constraints: iterative distance correction between joint pairs.

use fenrir_math::Fixed;

use crate::joint::Joint;

/// Squared distance below which a bone skips correction for the
/// iteration; there is no usable direction between coincident joints.
const DEGENERATE_DIST_SQ: Fixed = Fixed::from_ratio(1, 10_000);

/// A distance constraint between two joints, addressed by arena index.
#[derive(Clone, Copy, Debug)]
pub struct Bone {
    /// First joint index.
    pub a: usize,
    /// Second joint index.
    pub b: usize,
    /// Rest length, captured from the initial pose.
    pub rest_length: Fixed,
    /// Correction fraction in [0, 1].
    pub stiffness: Fixed,
}

impl Bone {
    /// Create a bone whose rest length is the current distance between
    /// the two joints.
    pub fn from_pose(joints: &[Joint], a: usize, b: usize, stiffness: Fixed) -> Self {
        let rest_length = (joints[b].position - joints[a].position).length();
        Self {
            a,
            b,
            rest_length,
            stiffness,
        }
    }

    /// One correction pass: move both ends toward the rest length, half
    /// the scaled error each, skipping anchored joints.
    pub fn solve(&self, joints: &mut [Joint]) {
        let delta = joints[self.b].position - joints[self.a].position;
        let dist_sq = delta.length_squared();
        if dist_sq < DEGENERATE_DIST_SQ {
            return;
        }
        let dist = dist_sq.sqrt();
        let diff = (self.rest_length - dist) / dist;
        let offset = delta * (diff * self.stiffness * Fixed::HALF);

        if !joints[self.a].anchored {
            joints[self.a].position -= offset;
        }
        if !joints[self.b].anchored {
            joints[self.b].position += offset;
        }
    }
}

/// Run `iterations` passes over all bones.
pub fn solve_all(joints: &mut [Joint], bones: &[Bone], iterations: u32) {
    for _ in 0..iterations {
        for bone in bones {
            bone.solve(joints);
        }
    }
}
