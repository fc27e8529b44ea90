//! Deterministic rigid-body physics for the combat simulation core.
//!
//! A single [`PhysicsManager`] owns every body, constraint, force field,
//! and the collision event queue, and is stepped once per host frame via
//! [`PhysicsManager::update`]. All state is fixed-point
//! ([`fenrir_math::Fixed`]) and all timing is integer microseconds, so a
//! replayed input sequence reproduces the simulation bit-for-bit on any
//! platform.

mod body;
mod collision;
mod config;
mod constraint;
mod events;
mod forces;
pub mod layers;
mod manager;
mod spatial;

#[cfg(test)]
mod manager_tests;

pub use body::{
    BodyError, BodyId, BodySpec, BodyType, GROUND_BODY_ID, PLAYER_BODY_ID, RigidBody,
    SLEEP_DELAY_US,
};
pub use config::PhysicsConfig;
pub use constraint::{DistanceConstraint, RangeConstraint};
pub use events::{CollisionEvent, EVENT_QUEUE_CAPACITY, EventQueue};
pub use forces::{ForceField, ForceFieldKind, ForceFieldManager};
pub use manager::PhysicsManager;
pub use spatial::SpatialHash;
