//! Optional per-step acceleration sources: radial attractors/repellers
//! and directional wind.

use fenrir_math::{Fixed, FixedVec3};

use crate::body::{BodyType, RigidBody};

/// What shape of acceleration a field contributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceFieldKind {
    /// Pulls dynamic bodies toward the field position.
    RadialAttract,
    /// Pushes dynamic bodies away from the field position.
    RadialRepel,
    /// Constant acceleration along a direction, everywhere.
    DirectionalWind,
}

/// One acceleration source.
#[derive(Clone, Debug)]
pub struct ForceField {
    pub kind: ForceFieldKind,
    /// Field center (radial kinds).
    pub position: FixedVec3,
    /// Wind direction (directional kind); normalized on application.
    pub direction: FixedVec3,
    /// Nominal influence radius, kept for gameplay queries.
    pub radius: Fixed,
    /// Field strength in force units.
    pub strength: Fixed,
}

/// Falloff for radial fields is 1/d², clamped so bodies brushing the
/// field center don't receive absurd accelerations.
const MAX_FALLOFF: Fixed = Fixed::from_int(100);

/// Squared distance under which a radial field stops acting; inside this
/// the direction is numerically meaningless.
const MIN_RADIAL_DIST_SQ: Fixed = Fixed::from_ratio(1, 100);

/// Owns the active force fields and applies them before integration.
#[derive(Default)]
pub struct ForceFieldManager {
    fields: Vec<ForceField>,
}

impl ForceFieldManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field.
    pub fn add(&mut self, field: ForceField) {
        self.fields.push(field);
    }

    /// Remove all fields.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Number of active fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no fields are active.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Accumulate field accelerations into each eligible body.
    ///
    /// Only awake Dynamic bodies with finite inverse mass respond;
    /// Knockback and Kinematic bodies are gameplay-driven and ignore
    /// ambient fields.
    pub fn apply(&self, bodies: &mut [RigidBody]) {
        if self.fields.is_empty() {
            return;
        }
        for body in bodies.iter_mut() {
            if body.body_type != BodyType::Dynamic || body.is_sleeping {
                continue;
            }
            if body.inverse_mass <= Fixed::ZERO {
                continue;
            }
            for field in &self.fields {
                match field.kind {
                    ForceFieldKind::RadialAttract => {
                        Self::apply_radial(body, field.position - body.position, field.strength);
                    }
                    ForceFieldKind::RadialRepel => {
                        Self::apply_radial(body, body.position - field.position, field.strength);
                    }
                    ForceFieldKind::DirectionalWind => {
                        let dir = field.direction.normalized();
                        if !dir.is_zero() {
                            body.acceleration += dir * field.strength * body.inverse_mass;
                        }
                    }
                }
            }
        }
    }

    fn apply_radial(body: &mut RigidBody, toward: FixedVec3, strength: Fixed) {
        let dist_sq = toward.length_squared();
        if dist_sq <= MIN_RADIAL_DIST_SQ {
            return;
        }
        let dir = toward.normalized();
        let falloff = (Fixed::ONE / dist_sq).min(MAX_FALLOFF);
        body.acceleration += dir * (strength * falloff) * body.inverse_mass;
    }
}
