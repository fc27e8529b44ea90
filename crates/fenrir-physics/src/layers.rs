//! Collision layer bits and the layer/mask pair predicate.
//!
//! Every body carries a layer (what it is) and a mask (what it collides
//! with). The predicate gates every candidate pair before any distance
//! math runs.

/// Collision layer bit assignments.
pub mod layer {
    /// Matches nothing.
    pub const NONE: u32 = 0;
    /// Untagged bodies.
    pub const DEFAULT: u32 = 1 << 0;
    /// The player combatant.
    pub const PLAYER: u32 = 1 << 1;
    /// Enemy combatants.
    pub const ENEMY: u32 = 1 << 2;
    /// Static and dynamic scenery.
    pub const ENVIRONMENT: u32 = 1 << 3;
    /// Thrown or launched objects.
    pub const PROJECTILE: u32 = 1 << 4;
    /// Matches everything.
    pub const ALL: u32 = u32::MAX;
}

/// True if two bodies' layer/mask pairs permit a collision.
///
/// Both directions must agree: A's mask must accept B's layer and B's
/// mask must accept A's layer.
pub fn should_collide(a_layer: u32, a_mask: u32, b_layer: u32, b_mask: u32) -> bool {
    (a_mask & b_layer) != 0 && (b_mask & a_layer) != 0
}
