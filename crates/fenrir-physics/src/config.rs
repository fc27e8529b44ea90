//! Simulation-wide configuration: gravity, fixed timestep, catch-up cap,
//! velocity limit, and world bounds.

use fenrir_math::{Fixed, FixedVec3};

/// Global physics configuration. Constructed once at initialization and
/// held by the manager; timing is integer microseconds so the step
/// length never depends on float rounding.
#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    /// World gravity acceleration. Applied to Dynamic bodies only.
    pub gravity: FixedVec3,
    /// Fixed timestep in microseconds (16_666 ≈ 60 Hz).
    pub timestep_us: i64,
    /// Maximum catch-up steps per `update` call. Bounds worst-case
    /// latency when the host stalls; leftover time stays accumulated.
    pub max_iterations: u32,
    /// Velocity magnitude clamp.
    pub max_velocity: Fixed,
    /// World bounding box, minimum corner.
    pub world_min: FixedVec3,
    /// World bounding box, maximum corner.
    pub world_max: FixedVec3,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: FixedVec3::new(
                Fixed::ZERO,
                Fixed::from_ratio(-981, 100),
                Fixed::ZERO,
            ),
            timestep_us: 16_666,
            max_iterations: 4,
            max_velocity: Fixed::from_int(50),
            world_min: FixedVec3::from_ints(-10, -10, -10),
            world_max: FixedVec3::from_ints(10, 10, 10),
        }
    }
}

impl PhysicsConfig {
    /// The timestep as fixed-point seconds, derived from the integer
    /// microsecond count so it is exact and platform-independent.
    pub fn timestep_fixed(&self) -> Fixed {
        Fixed::from_ratio(self.timestep_us, 1_000_000)
    }
}
