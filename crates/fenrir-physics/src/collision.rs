//! Narrow-phase collision resolution: sphere-sphere and sphere-ground.
//!
//! Resolution is positional separation plus a restitution impulse, with
//! defensive rejection of malformed geometry. Every resolved contact
//! wakes both participants and emits a [`CollisionEvent`].

use fenrir_math::{Fixed, FixedVec3};

use crate::body::{GROUND_BODY_ID, RigidBody};
use crate::events::{CollisionEvent, EventQueue};

/// Pairs farther apart than this (squared) are rejected as malformed
/// rather than resolved; nothing legitimate in the arena is 1000 units
/// from its neighbor.
const MAX_DISTANCE_SQ: Fixed = Fixed::from_int(1_000_000);

/// Bodies with radii under this are rejected as malformed.
const MIN_RADIUS: Fixed = Fixed::from_ratio(1, 1000);

/// Extra separation applied beyond the measured overlap.
const SEPARATION_BUFFER: Fixed = Fixed::from_ratio(4, 1000);

/// Widened buffer for near-equal-mass pairs, which otherwise re-contact
/// at the boundary every step and visibly stick together.
const SEPARATION_BUFFER_EQUAL_MASS: Fixed = Fixed::from_ratio(8, 1000);

/// Restitution for body-body contacts.
const RESTITUTION: Fixed = Fixed::from_ratio(15, 100);

/// Softer restitution for near-equal-mass contacts; paired combatants
/// trading blows should shove, not bounce.
const RESTITUTION_EQUAL_MASS: Fixed = Fixed::from_ratio(5, 100);

/// Mass-ratio window treated as "near-equal".
const EQUAL_MASS_LO: Fixed = Fixed::from_ratio(8, 10);
const EQUAL_MASS_HI: Fixed = Fixed::from_ratio(125, 100);

/// Resolve an overlapping sphere pair in place.
///
/// Separation is split by each body's share of the combined inverse
/// mass; the impulse is applied only when the bodies are approaching, so
/// resolution never pulls bodies together. Returns true if the pair
/// overlapped and was resolved.
pub fn resolve_sphere_collision(
    a: &mut RigidBody,
    b: &mut RigidBody,
    events: &mut EventQueue,
) -> bool {
    let delta = b.position - a.position;
    let dist_sq = delta.length_squared();
    let combined_radius = a.radius + b.radius;
    let combined_radius_sq = combined_radius * combined_radius;

    // Defensive bounds: skip malformed candidates entirely.
    if dist_sq > MAX_DISTANCE_SQ || a.radius < MIN_RADIUS || b.radius < MIN_RADIUS {
        return false;
    }
    if dist_sq >= combined_radius_sq || dist_sq <= Fixed::ZERO {
        return false;
    }

    let total_inv_mass = a.effective_inverse_mass() + b.effective_inverse_mass();
    if total_inv_mass <= Fixed::ZERO {
        return false;
    }

    a.wake();
    b.wake();

    let dist = dist_sq.sqrt();
    let normal = delta.normalized();
    let overlap = combined_radius - dist;

    let mass_ratio = a.mass / b.mass;
    let near_equal_mass = mass_ratio > EQUAL_MASS_LO && mass_ratio < EQUAL_MASS_HI;
    let buffer = if near_equal_mass {
        SEPARATION_BUFFER_EQUAL_MASS
    } else {
        SEPARATION_BUFFER
    };
    let total_separation = overlap + buffer;

    let ratio_a = a.effective_inverse_mass() / total_inv_mass;
    let ratio_b = b.effective_inverse_mass() / total_inv_mass;
    a.position -= normal * total_separation * ratio_a;
    b.position += normal * total_separation * ratio_b;

    let relative_velocity = b.velocity - a.velocity;
    let velocity_along_normal = relative_velocity.dot(normal);

    // Separated but receding or resting: no impulse.
    if velocity_along_normal >= Fixed::ZERO {
        return true;
    }

    let restitution = if near_equal_mass {
        RESTITUTION_EQUAL_MASS
    } else {
        RESTITUTION
    };
    let impulse_magnitude =
        -(Fixed::ONE + restitution) * velocity_along_normal / total_inv_mass;
    let impulse = normal * impulse_magnitude;
    a.velocity -= impulse * a.effective_inverse_mass();
    b.velocity += impulse * b.effective_inverse_mass();

    events.push(CollisionEvent {
        body_a: a.id,
        body_b: b.id,
        normal,
        contact: a.position + normal * a.radius,
        impulse: impulse_magnitude,
    });

    true
}

/// Resolve a body against the ground plane at `ground_y`.
///
/// A body whose lower extent is below the plane is placed exactly on the
/// surface; if it was moving downward, its vertical velocity reflects by
/// its own restitution, horizontal velocity scales by its own friction,
/// and a ground event is emitted with the sentinel id. Returns true if a
/// downward impact was resolved.
pub fn resolve_ground_collision(
    body: &mut RigidBody,
    ground_y: Fixed,
    events: &mut EventQueue,
) -> bool {
    if !body.should_collide() {
        return false;
    }

    let body_bottom = body.position.y - body.radius;
    if body_bottom >= ground_y {
        return false;
    }

    body.wake();
    body.position.y = ground_y + body.radius;

    if body.velocity.y >= Fixed::ZERO {
        return false;
    }

    events.push(CollisionEvent {
        body_a: body.id,
        body_b: GROUND_BODY_ID,
        normal: FixedVec3::from_ints(0, 1, 0),
        contact: FixedVec3::new(body.position.x, ground_y, body.position.z),
        impulse: -body.velocity.y * body.mass,
    });

    body.velocity.y = -body.velocity.y * body.restitution;
    body.velocity.x *= body.friction;
    body.velocity.z *= body.friction;

    true
}
