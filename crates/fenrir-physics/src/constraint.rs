//! Positional (PBD-style) two-body constraints: exact distance and
//! min/max range.
//!
//! Both solvers correct positions along the line connecting the bodies,
//! split proportionally to inverse mass and scaled by stiffness, for a
//! small fixed number of iterations. Lookups go through the manager's
//! id→index map, built once per solve call rather than per constraint.

use fenrir_math::Fixed;
use rustc_hash::FxHashMap;

use crate::body::{BodyId, RigidBody};

/// Holds two bodies at an exact rest length.
#[derive(Clone, Debug)]
pub struct DistanceConstraint {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub rest_length: Fixed,
    /// Correction fraction per iteration, in [0, 1].
    pub stiffness: Fixed,
}

/// Keeps two bodies' distance within [min, max]. A zero bound means
/// unbounded on that side.
#[derive(Clone, Debug)]
pub struct RangeConstraint {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub min_length: Fixed,
    pub max_length: Fixed,
    pub stiffness: Fixed,
}

/// Residual error below which the exact-distance solver leaves a pair
/// alone; correcting sub-epsilon errors just trades them for jitter.
const DISTANCE_EPSILON: Fixed = Fixed::from_ratio(1, 1024);

/// Iteratively enforce exact-distance constraints.
pub fn solve_distance_constraints(
    bodies: &mut [RigidBody],
    index_of: &FxHashMap<BodyId, usize>,
    constraints: &[DistanceConstraint],
    iterations: u32,
) {
    if constraints.is_empty() {
        return;
    }
    for _ in 0..iterations {
        for c in constraints {
            correct_pair(bodies, index_of, c.body_a, c.body_b, |dist| {
                let diff = dist - c.rest_length;
                if diff.abs() < DISTANCE_EPSILON {
                    None
                } else {
                    Some(diff * c.stiffness)
                }
            });
        }
    }
}

/// Iteratively enforce range constraints. Correction applies only when
/// the current distance is outside [min, max].
pub fn solve_range_constraints(
    bodies: &mut [RigidBody],
    index_of: &FxHashMap<BodyId, usize>,
    constraints: &[RangeConstraint],
    iterations: u32,
) {
    if constraints.is_empty() {
        return;
    }
    for _ in 0..iterations {
        for c in constraints {
            correct_pair(bodies, index_of, c.body_a, c.body_b, |dist| {
                let target = if c.max_length > Fixed::ZERO && dist > c.max_length {
                    c.max_length
                } else if c.min_length > Fixed::ZERO && dist < c.min_length {
                    c.min_length
                } else {
                    return None;
                };
                Some((dist - target) * c.stiffness)
            });
        }
    }
}

/// Shared correction step: compute the signed correction magnitude from
/// the current distance, then move both bodies along the connecting
/// line, split by inverse mass. Degenerate (near-zero) distances skip
/// the iteration; there is no line to correct along.
fn correct_pair(
    bodies: &mut [RigidBody],
    index_of: &FxHashMap<BodyId, usize>,
    id_a: BodyId,
    id_b: BodyId,
    correction: impl Fn(Fixed) -> Option<Fixed>,
) {
    let (Some(&ia), Some(&ib)) = (index_of.get(&id_a), index_of.get(&id_b)) else {
        return;
    };
    if ia == ib {
        return;
    }

    let delta = bodies[ib].position - bodies[ia].position;
    let dist_sq = delta.length_squared();
    if dist_sq <= Fixed::ZERO {
        return;
    }
    let dist = dist_sq.sqrt();
    let Some(magnitude) = correction(dist) else {
        return;
    };

    let inv_mass_a = bodies[ia].effective_inverse_mass();
    let inv_mass_b = bodies[ib].effective_inverse_mass();
    let inv_mass_sum = inv_mass_a + inv_mass_b;
    if inv_mass_sum <= Fixed::ZERO {
        return;
    }

    let normal = delta / dist;
    let ratio_a = inv_mass_a / inv_mass_sum;
    let ratio_b = inv_mass_b / inv_mass_sum;

    if ratio_a > Fixed::ZERO {
        bodies[ia].position += normal * (magnitude * ratio_a);
        bodies[ia].wake();
    }
    if ratio_b > Fixed::ZERO {
        bodies[ib].position -= normal * (magnitude * ratio_b);
        bodies[ib].wake();
    }
}
