//! Tuning structs with defaults and RON persistence.
//!
//! Tuning files hold human-editable float values; conversion into the
//! simulation's fixed-point types happens here and only here, through
//! [`Fixed::from_f32`]. Hosts must never convert through any other rule
//! or determinism across machines is lost.

use std::path::Path;

use serde::{Deserialize, Serialize};

use fenrir_math::{Fixed, FixedVec3};
use fenrir_physics::PhysicsConfig;
use fenrir_skeleton::BalanceSkeleton;

use crate::error::ConfigError;

/// Top-level tuning for the simulation core.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimTuning {
    /// Rigid-body world tuning.
    pub physics: PhysicsTuning,
    /// Balance skeleton tuning.
    pub skeleton: SkeletonTuning,
}

/// Rigid-body world tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Gravity acceleration (x, y, z).
    pub gravity: [f32; 3],
    /// Fixed timestep in microseconds.
    pub timestep_us: i64,
    /// Maximum catch-up steps per update call.
    pub max_iterations: u32,
    /// Velocity magnitude clamp.
    pub max_velocity: f32,
    /// World bounding box, minimum corner.
    pub world_min: [f32; 3],
    /// World bounding box, maximum corner.
    pub world_max: [f32; 3],
}

/// Balance skeleton tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkeletonTuning {
    /// Ground plane height (screen-space, y-down).
    pub ground_y: f32,
    /// Hip-strategy correction gain.
    pub balance_strength: f32,
    /// Ankle-strategy correction gain.
    pub ankle_flexibility: f32,
    /// Global Verlet damping factor.
    pub damping: f32,
    /// Downward gravity magnitude.
    pub gravity: f32,
    /// Master switch for the balance controller.
    pub auto_balance: bool,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            timestep_us: 16_666,
            max_iterations: 4,
            max_velocity: 50.0,
            world_min: [-10.0, -10.0, -10.0],
            world_max: [10.0, 10.0, 10.0],
        }
    }
}

impl Default for SkeletonTuning {
    fn default() -> Self {
        Self {
            ground_y: 0.1,
            balance_strength: 0.5,
            ankle_flexibility: 0.4,
            damping: 0.95,
            gravity: 9.8,
            auto_balance: true,
        }
    }
}

impl SimTuning {
    /// Load tuning from a RON file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let tuning = ron::from_str(&content).map_err(ConfigError::ParseError)?;
        log::info!("loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Save tuning to a RON file, pretty-printed for hand editing.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default();
        let content =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;
        std::fs::write(path, content).map_err(ConfigError::WriteError)?;
        log::info!("saved tuning to {}", path.display());
        Ok(())
    }
}

impl PhysicsTuning {
    /// Convert into the fixed-point [`PhysicsConfig`].
    pub fn to_config(&self) -> PhysicsConfig {
        PhysicsConfig {
            gravity: vec3_from_f32(self.gravity),
            timestep_us: self.timestep_us,
            max_iterations: self.max_iterations,
            max_velocity: Fixed::from_f32(self.max_velocity),
            world_min: vec3_from_f32(self.world_min),
            world_max: vec3_from_f32(self.world_max),
        }
    }
}

impl SkeletonTuning {
    /// Apply the tuning to a live skeleton.
    pub fn apply_to(&self, skeleton: &mut BalanceSkeleton) {
        skeleton.ground_y = Fixed::from_f32(self.ground_y);
        skeleton.balance_strength = Fixed::from_f32(self.balance_strength);
        skeleton.ankle_flexibility = Fixed::from_f32(self.ankle_flexibility);
        skeleton.damping = Fixed::from_f32(self.damping);
        skeleton.gravity = Fixed::from_f32(self.gravity);
        skeleton.auto_balance = self.auto_balance;
    }
}

fn vec3_from_f32(values: [f32; 3]) -> FixedVec3 {
    FixedVec3::from_f32(values[0], values[1], values[2])
}
