//! The balance skeleton: initialization, per-frame pipeline, ground
//! contact, and the three-tier balance controller.

use fenrir_math::{Fixed, FixedVec2};
use tracing::debug;

use crate::bone::{Bone, solve_all};
use crate::joint::{Joint, joints};

/// Constraint iterations after integration, before ground and balance.
const PRIMARY_SOLVE_ITERATIONS: u32 = 5;

/// Constraint iterations after balance, correcting what it disturbed.
const FINAL_SOLVE_ITERATIONS: u32 = 2;

/// Horizontal friction applied to grounded foot joints.
const GROUND_FRICTION: Fixed = Fixed::from_ratio(85, 100);

/// Vertical velocity retention for grounded foot joints; near-dead stop.
const VERTICAL_DAMP: Fixed = Fixed::from_ratio(2, 10);

/// A foot joint within this height of the ground counts as in contact.
const CONTACT_EPSILON: Fixed = Fixed::from_ratio(1, 1000);

/// Center-of-mass offsets under this trigger the ankle strategy.
const ANKLE_THRESHOLD: Fixed = Fixed::from_ratio(15, 1000);

/// Fraction of the flexibility-scaled offset the ankle correction uses.
const ANKLE_GAIN: Fixed = Fixed::from_ratio(8, 10);

/// Fraction of the ankle shift redistributed to heel and toe.
const ANKLE_SPREAD: Fixed = Fixed::from_ratio(3, 10);

/// Offsets beyond this trigger the stepping strategy.
const STEP_THRESHOLD: Fixed = Fixed::from_ratio(5, 100);

/// Fraction of the offset the trailing foot steps through.
const STEP_GAIN: Fixed = Fixed::from_ratio(1, 10);

/// Fraction of the offset converted into vertical weight shift.
const WEIGHT_SHIFT_GAIN: Fixed = Fixed::from_ratio(5, 100);

/// Weight factor for the foot on the side the body leans toward.
const LEAN_TOWARD_FACTOR: Fixed = Fixed::from_ratio(3, 2);

/// Weight factor for the foot on the side the body leans away from.
const LEAN_AWAY_FACTOR: Fixed = Fixed::from_ratio(1, 2);

/// Per-frame easing of each knee's x toward its ankle's x.
const KNEE_EASE: Fixed = Fixed::from_ratio(15, 100);

/// Hip-strategy cascade up the spine: lower spine, mid spine, chest,
/// neck, head.
const SPINE_CASCADE: [(usize, Fixed); 5] = [
    (joints::LOWER_SPINE, Fixed::from_ratio(8, 10)),
    (joints::MID_SPINE, Fixed::from_ratio(6, 10)),
    (joints::CHEST, Fixed::from_ratio(4, 10)),
    (joints::NECK, Fixed::from_ratio(2, 10)),
    (joints::HEAD, Fixed::from_ratio(1, 10)),
];

/// Initial pose: per joint, (x offset, y offset) in pose units and mass
/// as a ratio. Offsets are scaled by `scale × 0.01` at initialization;
/// y grows downward, so the head sits at a negative offset and the feet
/// at a positive one.
const JOINT_POSE: [(i64, i64, (i64, i64)); joints::COUNT] = [
    (0, -200, (4, 5)),    // head
    (0, -170, (1, 2)),    // neck
    (0, -140, (2, 1)),    // chest
    (0, -100, (5, 2)),    // mid spine
    (0, -60, (5, 2)),     // lower spine
    (0, -20, (3, 1)),     // pelvis
    (-35, -150, (1, 1)),  // shoulder L
    (35, -150, (1, 1)),   // shoulder R
    (-60, -100, (7, 10)), // elbow L
    (60, -100, (7, 10)),  // elbow R
    (-70, -50, (1, 2)),   // wrist L
    (70, -50, (1, 2)),    // wrist R
    (-75, -30, (2, 5)),   // hand L
    (75, -30, (2, 5)),    // hand R
    (-20, -10, (3, 2)),   // hip L
    (20, -10, (3, 2)),    // hip R
    (-25, 80, (6, 5)),    // knee L
    (25, 80, (6, 5)),     // knee R
    (-25, 160, (4, 5)),   // ankle L
    (25, 160, (4, 5)),    // ankle R
    (-25, 180, (3, 5)),   // heel L
    (25, 180, (3, 5)),    // heel R
    (-15, 180, (1, 2)),   // foot L
    (15, 180, (1, 2)),    // foot R
    (-5, 180, (2, 5)),    // toe L
    (5, 180, (2, 5)),     // toe R
];

/// Bone topology: joint pair plus stiffness in hundredths.
const BONE_TOPOLOGY: [(usize, usize, i64); 27] = [
    (joints::HEAD, joints::NECK, 95),
    (joints::NECK, joints::CHEST, 90),
    (joints::CHEST, joints::MID_SPINE, 85),
    (joints::MID_SPINE, joints::LOWER_SPINE, 85),
    (joints::LOWER_SPINE, joints::PELVIS, 90),
    (joints::CHEST, joints::SHOULDER_L, 95),
    (joints::CHEST, joints::SHOULDER_R, 95),
    (joints::SHOULDER_L, joints::SHOULDER_R, 80),
    (joints::SHOULDER_L, joints::ELBOW_L, 90),
    (joints::ELBOW_L, joints::WRIST_L, 90),
    (joints::WRIST_L, joints::HAND_L, 95),
    (joints::SHOULDER_R, joints::ELBOW_R, 90),
    (joints::ELBOW_R, joints::WRIST_R, 90),
    (joints::WRIST_R, joints::HAND_R, 95),
    (joints::PELVIS, joints::HIP_L, 95),
    (joints::PELVIS, joints::HIP_R, 95),
    (joints::HIP_L, joints::HIP_R, 80),
    (joints::HIP_L, joints::KNEE_L, 90),
    (joints::KNEE_L, joints::ANKLE_L, 90),
    (joints::ANKLE_L, joints::HEEL_L, 95),
    (joints::HEEL_L, joints::FOOT_L, 95),
    (joints::FOOT_L, joints::TOE_L, 95),
    (joints::HIP_R, joints::KNEE_R, 90),
    (joints::KNEE_R, joints::ANKLE_R, 90),
    (joints::ANKLE_R, joints::HEEL_R, 95),
    (joints::HEEL_R, joints::FOOT_R, 95),
    (joints::FOOT_R, joints::TOE_R, 95),
];

/// Averaged heel/foot/toe position per side; the simulator's output
/// contract to animation and gameplay consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FootPositions {
    pub left: FixedVec2,
    pub right: FixedVec2,
}

/// A 26-joint biped skeleton with Verlet integration, ground contact,
/// and human-balance-inspired corrections (ankle, hip, and stepping
/// strategies layered by disturbance size).
pub struct BalanceSkeleton {
    joints: Vec<Joint>,
    bones: Vec<Bone>,
    /// Ground plane height; y values at or beyond it are "on ground".
    pub ground_y: Fixed,
    /// Gain of the hip-strategy correction.
    pub balance_strength: Fixed,
    /// Gain of the ankle-strategy correction.
    pub ankle_flexibility: Fixed,
    /// Global Verlet damping factor.
    pub damping: Fixed,
    /// Downward gravity magnitude.
    pub gravity: Fixed,
    /// Master switch for the balance controller.
    pub auto_balance: bool,
    foot_contact_l: bool,
    foot_contact_r: bool,
    center_of_mass: FixedVec2,
    com_offset: Fixed,
}

impl BalanceSkeleton {
    /// Create a skeleton posed around `center` at the given scale.
    pub fn new(center: FixedVec2, scale: Fixed) -> Self {
        let mut skeleton = Self {
            joints: Vec::new(),
            bones: Vec::new(),
            ground_y: Fixed::from_ratio(1, 10),
            balance_strength: Fixed::from_ratio(1, 2),
            ankle_flexibility: Fixed::from_ratio(2, 5),
            damping: Fixed::from_ratio(95, 100),
            gravity: Fixed::from_ratio(98, 10),
            auto_balance: true,
            foot_contact_l: false,
            foot_contact_r: false,
            center_of_mass: FixedVec2::ZERO,
            com_offset: Fixed::ZERO,
        };
        skeleton.initialize(center, scale);
        skeleton
    }

    /// (Re)pose all joints at proportionally scaled offsets from
    /// `center` and rebuild the bone topology from that pose.
    pub fn initialize(&mut self, center: FixedVec2, scale: Fixed) {
        let s = scale * Fixed::from_ratio(1, 100);
        self.joints.clear();
        for &(x_off, y_off, (mass_num, mass_den)) in &JOINT_POSE {
            let position = FixedVec2::new(
                center.x + s * Fixed::from_int(x_off),
                center.y + s * Fixed::from_int(y_off),
            );
            self.joints
                .push(Joint::new(position, Fixed::from_ratio(mass_num, mass_den)));
        }
        self.bones.clear();
        for &(a, b, stiffness) in &BONE_TOPOLOGY {
            self.bones
                .push(Bone::from_pose(&self.joints, a, b, Fixed::from_ratio(stiffness, 100)));
        }
        self.foot_contact_l = false;
        self.foot_contact_r = false;
        self.center_of_mass = FixedVec2::ZERO;
        self.com_offset = Fixed::ZERO;
        debug!(
            joint_count = self.joints.len(),
            bone_count = self.bones.len(),
            "balance skeleton initialized"
        );
    }

    /// One simulation step. Order is fixed: gravity → Verlet → primary
    /// constraint solve → ground contact → balance → final solve.
    pub fn update(&mut self, dt: Fixed) {
        self.apply_gravity(dt);
        for joint in &mut self.joints {
            joint.verlet_update(self.damping);
        }
        solve_all(&mut self.joints, &self.bones, PRIMARY_SOLVE_ITERATIONS);
        self.apply_ground_constraints();
        self.apply_balance_forces();
        solve_all(&mut self.joints, &self.bones, FINAL_SOLVE_ITERATIONS);
    }

    /// Snap the pelvis to an externally driven anchor. This is the sole
    /// coupling point between the skeleton and the rest of the game.
    pub fn sync_to_player_position(&mut self, x: Fixed, y: Fixed) {
        self.joints[joints::PELVIS].position = FixedVec2::new(x, y);
    }

    /// Averaged heel/foot/toe position per side.
    pub fn get_foot_positions(&self) -> FootPositions {
        FootPositions {
            left: self.foot_average(&joints::FOOT_CHAIN_L),
            right: self.foot_average(&joints::FOOT_CHAIN_R),
        }
    }

    /// Displace a joint by `delta`, leaving its Verlet history in place
    /// so the displacement reads as an instantaneous shove. Gameplay
    /// uses this for hit reactions; out-of-range indices are ignored.
    pub fn nudge_joint(&mut self, index: usize, delta: FixedVec2) {
        if let Some(joint) = self.joints.get_mut(index) {
            joint.position += delta;
        }
    }

    /// Read access to the joint arena.
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Read access to the bones.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Ground contact flags, (left, right).
    pub fn foot_contact(&self) -> (bool, bool) {
        (self.foot_contact_l, self.foot_contact_r)
    }

    /// Horizontal offset of the center of mass from the support center,
    /// as of the most recent balance pass.
    pub fn com_offset(&self) -> Fixed {
        self.com_offset
    }

    /// Mass-weighted center of mass, as of the most recent balance pass.
    pub fn center_of_mass(&self) -> FixedVec2 {
        self.center_of_mass
    }

    // --- Pipeline stages ------------------------------------------------

    /// Verlet gravity: add g·dt² directly to each free joint's vertical
    /// position. No velocity term exists to integrate through.
    fn apply_gravity(&mut self, dt: Fixed) {
        let g_step = self.gravity * dt * dt;
        for joint in &mut self.joints {
            if !joint.anchored {
                joint.position.y += g_step;
            }
        }
    }

    /// Clamp foot-chain joints to the ground and damp their motion,
    /// then derive the per-foot contact flags.
    fn apply_ground_constraints(&mut self) {
        for &index in joints::FOOT_CHAIN_L.iter().chain(&joints::FOOT_CHAIN_R) {
            let joint = &mut self.joints[index];
            if joint.position.y > self.ground_y {
                joint.position.y = self.ground_y;
                let vel_x = joint.position.x - joint.previous.x;
                joint.previous.x = joint.position.x - vel_x * GROUND_FRICTION;
                let vel_y = joint.position.y - joint.previous.y;
                joint.previous.y = self.ground_y + vel_y * VERTICAL_DAMP;
            }
        }
        self.foot_contact_l = self.chain_touches_ground(&joints::FOOT_CHAIN_L);
        self.foot_contact_r = self.chain_touches_ground(&joints::FOOT_CHAIN_R);
    }

    /// The balance controller. Strategies layer by disturbance size:
    /// ankle nudges for small offsets, hip correction always, weight
    /// redistribution and a corrective step when leaning hard.
    fn apply_balance_forces(&mut self) {
        if !self.auto_balance {
            return;
        }
        self.center_of_mass = self.compute_center_of_mass();

        let support_center = match (self.foot_contact_l, self.foot_contact_r) {
            // Airborne: nothing to balance against.
            (false, false) => return,
            (true, false) => self.foot_average(&joints::FOOT_CHAIN_L).x,
            (false, true) => self.foot_average(&joints::FOOT_CHAIN_R).x,
            (true, true) => {
                (self.foot_average(&joints::FOOT_CHAIN_L).x
                    + self.foot_average(&joints::FOOT_CHAIN_R).x)
                    * Fixed::HALF
            }
        };
        let both_feet = self.foot_contact_l && self.foot_contact_r;

        let offset = self.center_of_mass.x - support_center;
        self.com_offset = offset;

        // Ankle strategy: small disturbances.
        if offset.abs() < ANKLE_THRESHOLD {
            let ankle_shift = -offset * self.ankle_flexibility * ANKLE_GAIN;
            if self.foot_contact_l {
                self.apply_ankle_shift(joints::ANKLE_L, joints::HEEL_L, joints::TOE_L, ankle_shift);
            }
            if self.foot_contact_r {
                self.apply_ankle_shift(joints::ANKLE_R, joints::HEEL_R, joints::TOE_R, ankle_shift);
            }
        }

        // Hip strategy: unconditional, cascading up the spine.
        let hip_correction = -offset * self.balance_strength;
        self.joints[joints::PELVIS].position.x += hip_correction;
        for (index, factor) in SPINE_CASCADE {
            self.joints[index].position.x += hip_correction * factor;
        }

        // Weight redistribution between two planted feet.
        if both_feet {
            let shift_amount = (offset * WEIGHT_SHIFT_GAIN).abs();
            let factor_l = if offset < Fixed::ZERO {
                LEAN_TOWARD_FACTOR
            } else {
                LEAN_AWAY_FACTOR
            };
            for index in joints::FOOT_CHAIN_L {
                self.joints[index].position.y -= shift_amount * factor_l;
            }
            let factor_r = if offset > Fixed::ZERO {
                LEAN_TOWARD_FACTOR
            } else {
                LEAN_AWAY_FACTOR
            };
            for index in joints::FOOT_CHAIN_R {
                self.joints[index].position.y -= shift_amount * factor_r;
            }
        }

        // Stepping strategy: shift the trailing foot toward the lean.
        if offset.abs() > STEP_THRESHOLD && both_feet {
            let step_adjust = offset * STEP_GAIN;
            if offset > Fixed::ZERO {
                for index in joints::FOOT_CHAIN_R {
                    self.joints[index].position.x += step_adjust;
                }
            } else {
                for index in joints::FOOT_CHAIN_L {
                    self.joints[index].position.x += step_adjust;
                }
            }
        }

        // Ease each planted leg's knee toward its ankle.
        if self.foot_contact_l {
            let target = self.joints[joints::ANKLE_L].position.x;
            let knee = &mut self.joints[joints::KNEE_L];
            knee.position.x += (target - knee.position.x) * KNEE_EASE;
        }
        if self.foot_contact_r {
            let target = self.joints[joints::ANKLE_R].position.x;
            let knee = &mut self.joints[joints::KNEE_R];
            knee.position.x += (target - knee.position.x) * KNEE_EASE;
        }
    }

    // --- Helpers --------------------------------------------------------

    fn compute_center_of_mass(&self) -> FixedVec2 {
        let mut weighted = FixedVec2::ZERO;
        let mut total_mass = Fixed::ZERO;
        for joint in &self.joints {
            weighted += joint.position * joint.mass;
            total_mass += joint.mass;
        }
        FixedVec2::new(weighted.x / total_mass, weighted.y / total_mass)
    }

    fn foot_average(&self, chain: &[usize; 3]) -> FixedVec2 {
        let sum = chain
            .iter()
            .fold(FixedVec2::ZERO, |acc, &i| acc + self.joints[i].position);
        FixedVec2::new(sum.x / Fixed::from_int(3), sum.y / Fixed::from_int(3))
    }

    fn chain_touches_ground(&self, chain: &[usize; 3]) -> bool {
        chain
            .iter()
            .any(|&i| self.joints[i].position.y >= self.ground_y - CONTACT_EPSILON)
    }

    fn apply_ankle_shift(&mut self, ankle: usize, heel: usize, toe: usize, shift: Fixed) {
        self.joints[ankle].position.x += shift;
        self.joints[heel].position.x -= shift * ANKLE_SPREAD;
        self.joints[toe].position.x += shift * ANKLE_SPREAD;
    }
}
