//! Rigid-body state: body types, validated construction, and the sleep
//! state machine.

use fenrir_math::{Fixed, FixedVec3};

use crate::layers::layer;

/// Identifier for a rigid body. Strictly increasing per manager; never
/// reused within a session.
pub type BodyId = u32;

/// Sentinel id used in collision events for the ground plane.
pub const GROUND_BODY_ID: BodyId = u32::MAX;

/// Reserved id of the player body created by `PhysicsManager::initialize`.
pub const PLAYER_BODY_ID: BodyId = 0;

/// Sustained low-motion time before a dynamic body falls asleep, in
/// microseconds of simulated time.
pub const SLEEP_DELAY_US: i64 = 1_000_000;

/// How physics drives a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyType {
    /// Affected by forces, gravity, and collisions.
    Dynamic,
    /// Moved only by `set_position`/`set_velocity`; exempt from forces,
    /// zero contribution in collision and constraint mass splits.
    Kinematic,
    /// Never moves; inverse mass is always zero.
    Static,
    /// Gameplay-driven mover that still accepts knockback: exempt from
    /// gravity and force fields, but carries a real inverse mass so
    /// impulses and collision response act on it. Simulated only while
    /// its velocity is nonzero, so knockback decays and then stops.
    Knockback,
}

/// Error rejected at body construction. These are the only conditions
/// the simulation treats as fatal rather than silently tolerating.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BodyError {
    /// Dynamic and Knockback bodies need a positive mass to derive a
    /// finite inverse mass.
    #[error("body mass must be positive for {0:?} bodies")]
    InvalidMass(BodyType),

    /// A non-positive collision radius breaks every sphere test.
    #[error("body radius must be positive")]
    InvalidRadius,
}

/// Specification for creating a rigid body. `build()` validates and
/// produces the internal [`RigidBody`]; the id is assigned by the
/// manager at creation time.
#[derive(Clone, Debug)]
pub struct BodySpec {
    pub body_type: BodyType,
    pub position: FixedVec3,
    pub mass: Fixed,
    pub friction: Fixed,
    pub restitution: Fixed,
    pub drag: Fixed,
    pub radius: Fixed,
    pub collision_layer: u32,
    pub collision_mask: u32,
    pub sleep_threshold: Fixed,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: FixedVec3::ZERO,
            mass: Fixed::from_int(70),
            friction: Fixed::from_ratio(9, 10),
            restitution: Fixed::from_ratio(3, 10),
            drag: Fixed::from_ratio(98, 100),
            radius: Fixed::from_ratio(5, 100),
            collision_layer: layer::DEFAULT,
            collision_mask: layer::ALL,
            sleep_threshold: Fixed::from_ratio(1, 100),
        }
    }
}

impl BodySpec {
    /// Validate the spec and produce a body with the given id.
    pub fn build(&self, id: BodyId) -> Result<RigidBody, BodyError> {
        if self.radius <= Fixed::ZERO {
            return Err(BodyError::InvalidRadius);
        }
        let inverse_mass = match self.body_type {
            BodyType::Static => Fixed::ZERO,
            BodyType::Kinematic => Fixed::ZERO,
            BodyType::Dynamic | BodyType::Knockback => {
                if self.mass <= Fixed::ZERO {
                    return Err(BodyError::InvalidMass(self.body_type));
                }
                Fixed::ONE / self.mass
            }
        };
        Ok(RigidBody {
            id,
            body_type: self.body_type,
            position: self.position,
            velocity: FixedVec3::ZERO,
            acceleration: FixedVec3::ZERO,
            mass: self.mass,
            inverse_mass,
            friction: self.friction,
            restitution: self.restitution,
            drag: self.drag,
            radius: self.radius,
            collision_layer: self.collision_layer,
            collision_mask: self.collision_mask,
            is_sleeping: false,
            sleep_threshold: self.sleep_threshold,
            sleep_timer_us: 0,
        })
    }
}

/// A simulated sphere body. All fields are fixed-point; mutate only
/// through the manager so wake bookkeeping stays consistent.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody {
    pub id: BodyId,
    pub body_type: BodyType,
    pub position: FixedVec3,
    pub velocity: FixedVec3,
    pub acceleration: FixedVec3,
    pub mass: Fixed,
    pub inverse_mass: Fixed,
    pub friction: Fixed,
    pub restitution: Fixed,
    pub drag: Fixed,
    pub radius: Fixed,
    pub collision_layer: u32,
    pub collision_mask: u32,
    pub is_sleeping: bool,
    pub sleep_threshold: Fixed,
    pub sleep_timer_us: i64,
}

impl RigidBody {
    /// Whether the integrator should move this body this step.
    ///
    /// Knockback bodies simulate only while moving, so decayed knockback
    /// leaves them fully under gameplay control.
    pub fn should_simulate(&self) -> bool {
        match self.body_type {
            BodyType::Static | BodyType::Kinematic => false,
            _ if self.is_sleeping => false,
            BodyType::Dynamic => true,
            BodyType::Knockback => !self.velocity.is_zero(),
        }
    }

    /// Whether this body participates in collision detection.
    pub fn should_collide(&self) -> bool {
        match self.body_type {
            BodyType::Static => false,
            BodyType::Dynamic => !self.is_sleeping,
            _ => true,
        }
    }

    /// Inverse mass as seen by collision and constraint splits.
    /// Kinematic and Static bodies never yield ground here.
    pub fn effective_inverse_mass(&self) -> Fixed {
        match self.body_type {
            BodyType::Static | BodyType::Kinematic => Fixed::ZERO,
            BodyType::Dynamic | BodyType::Knockback => self.inverse_mass,
        }
    }

    /// Whether gravity accelerates this body.
    pub fn affected_by_gravity(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Advance the sleep timer by one step of simulated time. Only
    /// dynamic bodies sleep; a second of sustained low motion puts the
    /// body to rest and zeroes its velocity and acceleration.
    pub fn update_sleep_state(&mut self, timestep_us: i64) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        let speed_sq = self.velocity.length_squared();
        let threshold_sq = self.sleep_threshold * self.sleep_threshold;
        if speed_sq < threshold_sq {
            self.sleep_timer_us += timestep_us;
            if self.sleep_timer_us > SLEEP_DELAY_US {
                self.is_sleeping = true;
                self.velocity = FixedVec3::ZERO;
                self.acceleration = FixedVec3::ZERO;
            }
        } else {
            self.sleep_timer_us = 0;
            self.is_sleeping = false;
        }
    }

    /// Clear the sleep flag and timer.
    pub fn wake(&mut self) {
        self.is_sleeping = false;
        self.sleep_timer_us = 0;
    }
}
