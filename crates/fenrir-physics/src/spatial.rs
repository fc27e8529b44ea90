//! Uniform-grid spatial hash broadphase.
//!
//! Non-static bodies are bucketed by cell each step; candidate pairs come
//! from within-cell pairs plus a canonical "forward" half of the eight
//! neighbor offsets, so every true neighboring pair is emitted exactly
//! once with no deduplication pass.

use fenrir_math::Fixed;
use rustc_hash::FxHashMap;

use crate::body::{BodyId, RigidBody};

/// Grid cell coordinate. Derived from fixed-point raw values with
/// euclidean division, so bucketing never crosses into float math.
type GridKey = (i64, i64);

/// Forward neighbor offsets: right, up, up-right, up-left.
///
/// Their negations are the other four neighbors, so each unordered cell
/// pair is visited from exactly one of its two cells. An implementation
/// scanning all eight offsets would double-count every cross-cell pair.
const FORWARD_NEIGHBORS: [(i64, i64); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// Uniform grid broadphase over the x/y plane.
///
/// Cell size is tuned to roughly four typical body radii: large enough
/// that a sphere pair spanning more than one cell gap cannot overlap,
/// small enough that buckets stay short.
pub struct SpatialHash {
    cell_size: Fixed,
    cells: FxHashMap<GridKey, Vec<BodyId>>,
}

impl SpatialHash {
    /// Create a grid with the default cell size (0.2).
    pub fn new() -> Self {
        Self::with_cell_size(Fixed::from_ratio(1, 5))
    }

    /// Create a grid with an explicit cell size.
    pub fn with_cell_size(cell_size: Fixed) -> Self {
        Self {
            cell_size,
            cells: FxHashMap::default(),
        }
    }

    /// Drop all buckets.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Rebuild the grid from current body positions. Static bodies are
    /// skipped; they never move and never initiate contacts.
    pub fn update(&mut self, bodies: &[RigidBody]) {
        self.cells.clear();
        for body in bodies {
            if body.body_type == crate::body::BodyType::Static {
                continue;
            }
            let key = self.key_for(body);
            self.cells.entry(key).or_default().push(body.id);
        }
    }

    /// Emit candidate pairs, each exactly once, ordered (low id, high id)
    /// and sorted. Sorting makes the output independent of bucket
    /// iteration order, which keeps downstream resolution deterministic.
    pub fn potential_pairs(&self) -> Vec<(BodyId, BodyId)> {
        let mut pairs = Vec::new();
        for (&(cx, cy), bucket) in &self.cells {
            // Within-cell pairs.
            for i in 0..bucket.len() {
                for j in (i + 1)..bucket.len() {
                    pairs.push(ordered(bucket[i], bucket[j]));
                }
            }
            // Cross-cell pairs through the forward offsets only.
            for (dx, dy) in FORWARD_NEIGHBORS {
                let Some(neighbor) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &a in bucket {
                    for &b in neighbor {
                        pairs.push(ordered(a, b));
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }

    fn key_for(&self, body: &RigidBody) -> GridKey {
        let cell_raw = self.cell_size.to_raw();
        (
            body.position.x.to_raw().div_euclid(cell_raw),
            body.position.y.to_raw().div_euclid(cell_raw),
        )
    }
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new()
    }
}

fn ordered(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a < b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodySpec;
    use fenrir_math::FixedVec3;

    fn body_at(id: BodyId, x: f32, y: f32) -> RigidBody {
        let spec = BodySpec {
            position: FixedVec3::from_f32(x, y, 0.0),
            ..BodySpec::default()
        };
        spec.build(id).unwrap()
    }

    #[test]
    fn test_same_cell_pair_emitted_once() {
        let bodies = vec![body_at(1, 0.05, 0.05), body_at(2, 0.06, 0.05)];
        let mut grid = SpatialHash::new();
        grid.update(&bodies);
        assert_eq!(grid.potential_pairs(), vec![(1, 2)]);
    }

    #[test]
    fn test_adjacent_cell_pair_emitted_once() {
        // Cells (0,0) and (1,0) with cell size 0.2.
        let bodies = vec![body_at(1, 0.19, 0.05), body_at(2, 0.21, 0.05)];
        let mut grid = SpatialHash::new();
        grid.update(&bodies);
        assert_eq!(grid.potential_pairs(), vec![(1, 2)]);
    }

    #[test]
    fn test_diagonal_cell_pair_emitted_once() {
        let bodies = vec![body_at(1, 0.19, 0.19), body_at(2, 0.21, 0.21)];
        let mut grid = SpatialHash::new();
        grid.update(&bodies);
        assert_eq!(grid.potential_pairs(), vec![(1, 2)]);
    }

    #[test]
    fn test_anti_diagonal_cell_pair_emitted_once() {
        // (0,0) and (-1,1) are forward neighbors through (-1, 1).
        let bodies = vec![body_at(1, 0.01, 0.19), body_at(2, -0.01, 0.21)];
        let mut grid = SpatialHash::new();
        grid.update(&bodies);
        assert_eq!(grid.potential_pairs(), vec![(1, 2)]);
    }

    #[test]
    fn test_distant_bodies_no_pair() {
        let bodies = vec![body_at(1, 0.0, 0.0), body_at(2, 5.0, 5.0)];
        let mut grid = SpatialHash::new();
        grid.update(&bodies);
        assert!(grid.potential_pairs().is_empty());
    }

    #[test]
    fn test_static_bodies_excluded() {
        let mut s = body_at(1, 0.05, 0.05);
        s.body_type = crate::body::BodyType::Static;
        let bodies = vec![s, body_at(2, 0.06, 0.05)];
        let mut grid = SpatialHash::new();
        grid.update(&bodies);
        assert!(grid.potential_pairs().is_empty());
    }

    #[test]
    fn test_negative_coordinates_bucket_correctly() {
        // div_euclid keeps cells uniform across the origin: -0.01 lands
        // in cell -1, not cell 0.
        let bodies = vec![body_at(1, -0.01, 0.05), body_at(2, 0.01, 0.05)];
        let mut grid = SpatialHash::new();
        grid.update(&bodies);
        assert_eq!(grid.potential_pairs(), vec![(1, 2)]);
    }

    /// Oracle check: for a deterministic pseudo-random layout, the grid's
    /// pair set must equal the naive all-pairs set filtered to cell
    /// adjacency, and contain no duplicates.
    #[test]
    fn test_broadphase_matches_naive_oracle() {
        let mut bodies = Vec::new();
        let mut seed: u64 = 0x9E3779B97F4A7C15;
        for id in 0..40u32 {
            // xorshift for reproducible scatter in [-1, 1).
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let x = ((seed % 2000) as f32 / 1000.0) - 1.0;
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let y = ((seed % 2000) as f32 / 1000.0) - 1.0;
            bodies.push(body_at(id, x, y));
        }

        let mut grid = SpatialHash::new();
        grid.update(&bodies);
        let pairs = grid.potential_pairs();

        // No duplicates.
        let mut deduped = pairs.clone();
        deduped.dedup();
        assert_eq!(pairs.len(), deduped.len(), "duplicate pairs emitted");

        // Oracle: every pair of bodies in the same or adjacent cells.
        let cell = |b: &RigidBody| {
            let cs = Fixed::from_ratio(1, 5).to_raw();
            (
                b.position.x.to_raw().div_euclid(cs),
                b.position.y.to_raw().div_euclid(cs),
            )
        };
        let mut expected = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (ax, ay) = cell(&bodies[i]);
                let (bx, by) = cell(&bodies[j]);
                if (ax - bx).abs() <= 1 && (ay - by).abs() <= 1 {
                    expected.push(ordered(bodies[i].id, bodies[j].id));
                }
            }
        }
        expected.sort_unstable();
        assert_eq!(pairs, expected);
    }
}
