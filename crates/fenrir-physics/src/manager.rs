//! The physics manager: owns all bodies and constraints, runs the
//! fixed-timestep loop, and exposes the per-frame boundary surface.
//!
//! Step pipeline, in fixed order: force fields → integration → ground
//! collisions → body-body collisions → constraint solving → sleep
//! bookkeeping. Time is accumulated as integer microseconds; a step
//! either runs in full or not at all.

use std::time::Instant;

use fenrir_math::{Fixed, FixedVec3};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::body::{BodyError, BodyId, BodySpec, BodyType, PLAYER_BODY_ID, RigidBody};
use crate::collision::{resolve_ground_collision, resolve_sphere_collision};
use crate::config::PhysicsConfig;
use crate::constraint::{
    DistanceConstraint, RangeConstraint, solve_distance_constraints, solve_range_constraints,
};
use crate::events::EventQueue;
use crate::forces::{ForceField, ForceFieldManager};
use crate::layers::{self, layer};
use crate::spatial::SpatialHash;

/// Constraint solver iterations per step, run after collision response
/// so constraints correct residual contact error.
const CONSTRAINT_ITERATIONS: u32 = 4;

/// Squared speed under which a velocity is snapped to zero. This is
/// what lets drag-decayed knockback actually stop and dynamic bodies
/// reach their sleep threshold.
const MIN_SPEED_SQ: Fixed = Fixed::from_ratio(1, 1_000_000);

/// Height of the ground plane.
const GROUND_Y: Fixed = Fixed::ZERO;

/// Owns and steps the entire rigid-body simulation.
///
/// Single-threaded and synchronous: one `update` call per host frame,
/// nothing suspends mid-step. Constraints and events reference bodies by
/// id only, so body storage is free to swap-remove and compact.
pub struct PhysicsManager {
    config: PhysicsConfig,
    bodies: Vec<RigidBody>,
    index_of: FxHashMap<BodyId, usize>,
    next_body_id: BodyId,
    tick_accumulator: i64,
    use_broadphase: bool,
    spatial_hash: SpatialHash,
    force_fields: ForceFieldManager,
    distance_constraints: Vec<DistanceConstraint>,
    range_constraints: Vec<RangeConstraint>,
    events: EventQueue,
    pairs_checked: u32,
    collisions_resolved: u32,
    last_step_time_ms: f32,
}

impl PhysicsManager {
    /// Create a manager and initialize it with `config`.
    pub fn new(config: PhysicsConfig) -> Self {
        let mut manager = Self {
            config,
            bodies: Vec::new(),
            index_of: FxHashMap::default(),
            next_body_id: 1,
            tick_accumulator: 0,
            use_broadphase: false,
            spatial_hash: SpatialHash::new(),
            force_fields: ForceFieldManager::new(),
            distance_constraints: Vec::new(),
            range_constraints: Vec::new(),
            events: EventQueue::new(),
            pairs_checked: 0,
            collisions_resolved: 0,
            last_step_time_ms: 0.0,
        };
        manager.reset_state();
        manager
    }

    /// Reset all state and store a new configuration.
    pub fn initialize(&mut self, config: PhysicsConfig) {
        self.config = config;
        self.reset_state();
        debug!(
            timestep_us = self.config.timestep_us,
            max_iterations = self.config.max_iterations,
            "physics manager initialized"
        );
    }

    /// Reset to the initial state, reusing the stored configuration.
    pub fn reset(&mut self) {
        self.reset_state();
        debug!("physics manager reset");
    }

    fn reset_state(&mut self) {
        self.bodies.clear();
        self.index_of.clear();
        self.next_body_id = 1;
        self.tick_accumulator = 0;
        self.distance_constraints.clear();
        self.range_constraints.clear();
        self.force_fields.clear();
        self.events.clear();
        self.pairs_checked = 0;
        self.collisions_resolved = 0;
        self.last_step_time_ms = 0.0;
        self.spawn_player_body();
    }

    /// The player body: a knockback-kinematic mover with heavy drag so
    /// combat shoves decay fast, colliding with enemies and scenery.
    fn spawn_player_body(&mut self) {
        let spec = BodySpec {
            body_type: BodyType::Knockback,
            position: FixedVec3::new(Fixed::HALF, Fixed::HALF, Fixed::ZERO),
            mass: Fixed::from_int(70),
            drag: Fixed::from_ratio(88, 100),
            radius: Fixed::HALF,
            collision_layer: layer::PLAYER,
            collision_mask: layer::ENEMY | layer::ENVIRONMENT,
            ..BodySpec::default()
        };
        // The player spec is statically valid; build cannot fail for it.
        if let Ok(body) = spec.build(PLAYER_BODY_ID) {
            self.index_of.insert(PLAYER_BODY_ID, self.bodies.len());
            self.bodies.push(body);
        }
    }

    /// Advance the simulation by `delta_seconds` of host time.
    ///
    /// The elapsed time accumulates as integer microseconds; whole fixed
    /// steps run while at least one timestep is banked, capped at
    /// `max_iterations` per call. Leftover time stays in the accumulator
    /// for the next call; no step is dropped, split, or double-run.
    pub fn update(&mut self, delta_seconds: f64) {
        if delta_seconds <= 0.0 {
            return;
        }
        self.tick_accumulator += (delta_seconds * 1_000_000.0) as i64;

        let step_us = self.config.timestep_us;
        let dt = self.config.timestep_fixed();
        let started = Instant::now();
        let mut steps_taken: u32 = 0;
        while self.tick_accumulator >= step_us && steps_taken < self.config.max_iterations {
            self.step(dt);
            self.tick_accumulator -= step_us;
            steps_taken += 1;
        }
        if steps_taken > 0 {
            // Wall-clock timing: instrumentation only, never fed back
            // into simulation state.
            self.last_step_time_ms = started.elapsed().as_secs_f32() * 1000.0;
        }
    }

    /// Run one fixed step. Order is a hard contract.
    fn step(&mut self, dt: Fixed) {
        self.force_fields.apply(&mut self.bodies);
        self.integrate(dt);
        self.resolve_ground_pass();
        self.resolve_body_pass();
        solve_distance_constraints(
            &mut self.bodies,
            &self.index_of,
            &self.distance_constraints,
            CONSTRAINT_ITERATIONS,
        );
        solve_range_constraints(
            &mut self.bodies,
            &self.index_of,
            &self.range_constraints,
            CONSTRAINT_ITERATIONS,
        );
        for body in &mut self.bodies {
            body.update_sleep_state(self.config.timestep_us);
        }
    }

    fn integrate(&mut self, dt: Fixed) {
        let gravity = self.config.gravity;
        let max_velocity = self.config.max_velocity;
        let max_speed_sq = max_velocity * max_velocity;
        let world_min = self.config.world_min;
        let world_max = self.config.world_max;

        for body in &mut self.bodies {
            if !body.should_simulate() {
                continue;
            }

            let mut total_accel = body.acceleration;
            if body.affected_by_gravity() {
                total_accel += gravity;
            }
            body.velocity += total_accel * dt;
            // Forces are single-frame contributions.
            body.acceleration = FixedVec3::ZERO;

            body.velocity *= body.drag;

            let speed_sq = body.velocity.length_squared();
            if speed_sq > max_speed_sq {
                body.velocity = body.velocity.normalized() * max_velocity;
            } else if speed_sq < MIN_SPEED_SQ {
                body.velocity = FixedVec3::ZERO;
            }

            body.position += body.velocity * dt;
            clamp_to_world_bounds(body, world_min, world_max);
        }
    }

    fn resolve_ground_pass(&mut self) {
        for body in &mut self.bodies {
            if resolve_ground_collision(body, GROUND_Y, &mut self.events) {
                self.collisions_resolved += 1;
            }
        }
    }

    fn resolve_body_pass(&mut self) {
        if self.use_broadphase {
            self.spatial_hash.update(&self.bodies);
            let pairs = self.spatial_hash.potential_pairs();
            for (id_a, id_b) in pairs {
                let (Some(&i), Some(&j)) = (self.index_of.get(&id_a), self.index_of.get(&id_b))
                else {
                    continue;
                };
                let (i, j) = if i < j { (i, j) } else { (j, i) };
                self.resolve_candidate(i, j);
            }
        } else {
            let count = self.bodies.len();
            for i in 0..count {
                for j in (i + 1)..count {
                    self.resolve_candidate(i, j);
                }
            }
        }
    }

    /// Narrow-phase entry for one candidate pair: cheap filters first,
    /// distance math only after the layer/mask test passes.
    fn resolve_candidate(&mut self, i: usize, j: usize) {
        if !self.bodies[i].should_collide() || !self.bodies[j].should_collide() {
            return;
        }
        let (a, b) = (&self.bodies[i], &self.bodies[j]);
        if !layers::should_collide(
            a.collision_layer,
            a.collision_mask,
            b.collision_layer,
            b.collision_mask,
        ) {
            return;
        }
        self.pairs_checked += 1;
        let (a, b) = pair_mut(&mut self.bodies, i, j);
        if resolve_sphere_collision(a, b, &mut self.events) {
            self.collisions_resolved += 1;
        }
    }

    // --- Body lifecycle -------------------------------------------------

    /// Create a body from a validated spec; returns its new id.
    pub fn create_body(&mut self, spec: &BodySpec) -> Result<BodyId, BodyError> {
        let id = self.next_body_id;
        let body = spec.build(id)?;
        self.next_body_id += 1;
        self.index_of.insert(id, self.bodies.len());
        self.bodies.push(body);
        trace!(id, body_type = ?spec.body_type, "body created");
        Ok(id)
    }

    /// Create an enemy combatant body at (x, y) with the given radius.
    pub fn create_wolf_body(
        &mut self,
        x: Fixed,
        y: Fixed,
        radius: Fixed,
    ) -> Result<BodyId, BodyError> {
        let spec = BodySpec {
            body_type: BodyType::Dynamic,
            position: FixedVec3::new(x, y, Fixed::ZERO),
            mass: Fixed::from_int(40),
            friction: Fixed::from_ratio(9, 10),
            restitution: Fixed::from_ratio(1, 10),
            drag: Fixed::from_ratio(92, 100),
            radius,
            collision_layer: layer::ENEMY,
            collision_mask: layer::PLAYER | layer::ENEMY | layer::ENVIRONMENT,
            ..BodySpec::default()
        };
        self.create_body(&spec)
    }

    /// Destroy a body: purge every constraint referencing it, then
    /// swap-remove it from storage, patching the moved body's index.
    /// Unknown ids are silently ignored.
    pub fn destroy_body(&mut self, id: BodyId) {
        self.distance_constraints
            .retain(|c| c.body_a != id && c.body_b != id);
        self.range_constraints
            .retain(|c| c.body_a != id && c.body_b != id);

        let Some(index) = self.index_of.remove(&id) else {
            return;
        };
        self.bodies.swap_remove(index);
        if index < self.bodies.len() {
            let moved_id = self.bodies[index].id;
            self.index_of.insert(moved_id, index);
        }
        trace!(id, "body destroyed");
    }

    /// Look up a body by id.
    pub fn get_body(&self, id: BodyId) -> Option<&RigidBody> {
        self.index_of.get(&id).map(|&index| &self.bodies[index])
    }

    fn get_body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.index_of
            .get(&id)
            .map(|&index| &mut self.bodies[index])
    }

    // --- Force/impulse application --------------------------------------

    /// Instant velocity change: Δv = impulse × inverse mass. Wakes the
    /// body. Unknown ids are silent no-ops.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: FixedVec3) {
        if let Some(body) = self.get_body_mut(id) {
            body.wake();
            let delta = impulse * body.inverse_mass;
            body.velocity += delta;
        }
    }

    /// Accumulate a single-frame force: a += F × inverse mass.
    pub fn apply_force(&mut self, id: BodyId, force: FixedVec3) {
        if let Some(body) = self.get_body_mut(id) {
            body.wake();
            let delta = force * body.inverse_mass;
            body.acceleration += delta;
        }
    }

    /// Overwrite a body's velocity. Wakes only when set to nonzero, so
    /// zeroing a resting body doesn't restart its sleep countdown.
    pub fn set_velocity(&mut self, id: BodyId, velocity: FixedVec3) {
        if let Some(body) = self.get_body_mut(id) {
            if !velocity.is_zero() {
                body.wake();
            }
            body.velocity = velocity;
        }
    }

    /// Teleport a body. Wakes it; a moved body must re-earn sleep.
    pub fn set_position(&mut self, id: BodyId, position: FixedVec3) {
        if let Some(body) = self.get_body_mut(id) {
            body.wake();
            body.position = position;
        }
    }

    // --- Constraints ----------------------------------------------------

    /// Register an exact-distance constraint.
    pub fn add_distance_constraint(&mut self, constraint: DistanceConstraint) {
        self.distance_constraints.push(constraint);
    }

    /// Register a min/max range constraint.
    pub fn add_range_constraint(&mut self, constraint: RangeConstraint) {
        self.range_constraints.push(constraint);
    }

    /// Remove all constraints.
    pub fn clear_constraints(&mut self) {
        self.distance_constraints.clear();
        self.range_constraints.clear();
    }

    // --- Force fields ---------------------------------------------------

    /// Register a force field.
    pub fn add_force_field(&mut self, field: ForceField) {
        self.force_fields.add(field);
    }

    /// Remove all force fields.
    pub fn clear_force_fields(&mut self) {
        self.force_fields.clear();
    }

    // --- Broadphase -----------------------------------------------------

    /// Select the body-body candidate source: spatial hash when enabled,
    /// naive O(n²) scan otherwise. Both feed the same narrow phase.
    pub fn enable_broadphase(&mut self, enabled: bool) {
        self.use_broadphase = enabled;
    }

    // --- Events ---------------------------------------------------------

    /// Read access to queued collision events.
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Drain queued collision events, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = crate::events::CollisionEvent> + '_ {
        self.events.drain()
    }

    // --- Instrumentation (read-only; never feeds back) ------------------

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Candidate pairs that reached narrow-phase math since initialize.
    pub fn pairs_checked(&self) -> u32 {
        self.pairs_checked
    }

    /// Contacts resolved (body-body and ground) since initialize.
    pub fn collisions_resolved(&self) -> u32 {
        self.collisions_resolved
    }

    /// Wall-clock duration of the most recent update's step batch.
    pub fn last_step_time_ms(&self) -> f32 {
        self.last_step_time_ms
    }

    /// Unspent simulated time in microseconds.
    pub fn tick_accumulator(&self) -> i64 {
        self.tick_accumulator
    }

    /// The active configuration.
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }
}

/// Clamp a body into the world box. A violated axis zeroes that axis's
/// velocity and wakes the body, as hitting a wall should.
fn clamp_to_world_bounds(body: &mut RigidBody, world_min: FixedVec3, world_max: FixedVec3) {
    let mut hit_bound = false;

    if body.position.x < world_min.x {
        body.position.x = world_min.x;
        body.velocity.x = Fixed::ZERO;
        hit_bound = true;
    } else if body.position.x > world_max.x {
        body.position.x = world_max.x;
        body.velocity.x = Fixed::ZERO;
        hit_bound = true;
    }

    if body.position.y < world_min.y {
        body.position.y = world_min.y;
        body.velocity.y = Fixed::ZERO;
        hit_bound = true;
    } else if body.position.y > world_max.y {
        body.position.y = world_max.y;
        body.velocity.y = Fixed::ZERO;
        hit_bound = true;
    }

    if body.position.z < world_min.z {
        body.position.z = world_min.z;
        body.velocity.z = Fixed::ZERO;
        hit_bound = true;
    } else if body.position.z > world_max.z {
        body.position.z = world_max.z;
        body.velocity.z = Fixed::ZERO;
        hit_bound = true;
    }

    if hit_bound {
        body.wake();
    }
}

/// Disjoint mutable access to two bodies, `i < j`.
fn pair_mut(bodies: &mut [RigidBody], i: usize, j: usize) -> (&mut RigidBody, &mut RigidBody) {
    debug_assert!(i < j);
    let (head, tail) = bodies.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}
