//! Skeleton joints: planar point masses with Verlet state.

use fenrir_math::{Fixed, FixedVec2};

/// Arena indices for the 26 joints of the biped topology. Bones and the
/// balance code address joints by these indices, never by reference, so
/// the arena can be moved or copied freely.
pub mod joints {
    pub const HEAD: usize = 0;
    pub const NECK: usize = 1;
    pub const CHEST: usize = 2;
    pub const MID_SPINE: usize = 3;
    pub const LOWER_SPINE: usize = 4;
    pub const PELVIS: usize = 5;
    pub const SHOULDER_L: usize = 6;
    pub const SHOULDER_R: usize = 7;
    pub const ELBOW_L: usize = 8;
    pub const ELBOW_R: usize = 9;
    pub const WRIST_L: usize = 10;
    pub const WRIST_R: usize = 11;
    pub const HAND_L: usize = 12;
    pub const HAND_R: usize = 13;
    pub const HIP_L: usize = 14;
    pub const HIP_R: usize = 15;
    pub const KNEE_L: usize = 16;
    pub const KNEE_R: usize = 17;
    pub const ANKLE_L: usize = 18;
    pub const ANKLE_R: usize = 19;
    pub const HEEL_L: usize = 20;
    pub const HEEL_R: usize = 21;
    pub const FOOT_L: usize = 22;
    pub const FOOT_R: usize = 23;
    pub const TOE_L: usize = 24;
    pub const TOE_R: usize = 25;

    /// Total joint count.
    pub const COUNT: usize = 26;

    /// The foot-chain joints that can contact the ground, left side.
    pub const FOOT_CHAIN_L: [usize; 3] = [HEEL_L, FOOT_L, TOE_L];
    /// The foot-chain joints that can contact the ground, right side.
    pub const FOOT_CHAIN_R: [usize; 3] = [HEEL_R, FOOT_R, TOE_R];
}

/// A point mass with Verlet state: current and previous position stand
/// in for an explicit velocity.
#[derive(Clone, Copy, Debug)]
pub struct Joint {
    /// Current position.
    pub position: FixedVec2,
    /// Position at the previous step.
    pub previous: FixedVec2,
    /// Mass, used for the center-of-mass computation.
    pub mass: Fixed,
    /// Anchored joints are externally driven and skip integration.
    pub anchored: bool,
}

impl Joint {
    /// Create a joint at rest at `position`.
    pub fn new(position: FixedVec2, mass: Fixed) -> Self {
        Self {
            position,
            previous: position,
            mass,
            anchored: false,
        }
    }

    /// Implied velocity: the displacement covered last step.
    pub fn velocity(&self) -> FixedVec2 {
        self.position - self.previous
    }

    /// One Verlet step: carry the previous displacement forward, scaled
    /// by the global damping factor.
    pub fn verlet_update(&mut self, damping: Fixed) {
        if self.anchored {
            return;
        }
        let current = self.position;
        self.position += (self.position - self.previous) * damping;
        self.previous = current;
    }
}
