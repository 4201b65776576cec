//! Uniform-grid spatial index for candidate neighbor queries.
//!
//! Points are bucketed by integer cell coordinate
//! `(floor(x / cell_size), floor(y / cell_size))`. The index stores bare
//! `usize` indices and knows nothing about what they refer to; callers
//! insert `(position, index)` pairs and get candidate indices back from
//! [`SpatialHash::query_neighbors`].

use glam::Vec2;
use std::collections::HashMap;

/// Integer cell coordinate in the uniform grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CellKey {
    x: i32,
    y: i32,
}

#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    grid: HashMap<CellKey, Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            grid: HashMap::new(),
        }
    }

    /// Drops all buckets; the cell size is unchanged.
    pub fn clear(&mut self) {
        self.grid.clear();
    }

    /// Sets the cell size (clamped to at least 1) and drops all buckets.
    ///
    /// Existing points must be re-inserted by the caller, typically via
    /// [`SpatialHash::rebuild`].
    pub fn set_cell_size(&mut self, s: f32) {
        self.cell_size = s.max(1.0);
        self.clear();
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn to_key(&self, p: Vec2) -> CellKey {
        CellKey {
            x: (p.x / self.cell_size).floor() as i32,
            y: (p.y / self.cell_size).floor() as i32,
        }
    }

    /// Appends `index` to the bucket for `p`'s cell. O(1) amortized.
    pub fn insert(&mut self, p: Vec2, index: usize) {
        let key = self.to_key(p);
        self.grid.entry(key).or_default().push(index);
    }

    /// Clears all buckets and inserts every point in input order, so the
    /// stored index of each point is its position in `points`. O(n).
    pub fn rebuild(&mut self, points: &[Vec2]) {
        self.clear();
        for (i, &p) in points.iter().enumerate() {
            self.insert(p, i);
        }
    }

    /// Collects candidate indices from the 3×3 block of cells around `p`.
    ///
    /// The result is a conservative superset of the points within
    /// `cell_size` of `p`; it is not filtered by exact distance, so callers
    /// must re-check. Cells are scanned row-major and buckets keep insertion
    /// order, so repeated queries over the same contents return the same
    /// sequence. A point belongs to exactly one cell, so duplicates are
    /// impossible.
    pub fn query_neighbors(&self, p: Vec2, out: &mut Vec<usize>) {
        out.clear();
        let k = self.to_key(p);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let kk = CellKey {
                    x: k.x + dx,
                    y: k.y + dy,
                };
                if let Some(bucket) = self.grid.get(&kk) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn query_returns_points_in_adjacent_cells() {
        let mut hash = SpatialHash::new(8.0);
        hash.insert(Vec2::new(0.0, 0.0), 0);
        hash.insert(Vec2::new(6.0, 6.0), 1);

        let mut out = Vec::new();
        hash.query_neighbors(Vec2::new(5.0, 5.0), &mut out);

        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn inserted_point_is_found_at_its_own_position() {
        let mut hash = SpatialHash::new(8.0);
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(-13.5, 7.25),
            Vec2::new(100.0, -42.0),
            Vec2::new(-7.9999, -8.0001),
        ];
        for (i, &p) in points.iter().enumerate() {
            hash.insert(p, i);
        }

        let mut out = Vec::new();
        for (i, &p) in points.iter().enumerate() {
            hash.query_neighbors(p, &mut out);
            assert!(
                out.contains(&i),
                "query at {:?} should return index {}",
                p,
                i
            );
        }
    }

    #[test]
    fn set_cell_size_clamps_to_one_and_drops_buckets() {
        let mut hash = SpatialHash::new(8.0);
        hash.insert(Vec2::new(1.0, 1.0), 0);

        hash.set_cell_size(0.25);
        assert_eq!(hash.cell_size(), 1.0);

        let mut out = Vec::new();
        hash.query_neighbors(Vec2::new(1.0, 1.0), &mut out);
        assert!(out.is_empty(), "buckets should be empty after resize");
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut hash = SpatialHash::new(8.0);
        hash.insert(Vec2::new(100.0, 100.0), 7);

        hash.rebuild(&[Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0)]);

        let mut out = Vec::new();
        hash.query_neighbors(Vec2::new(1.0, 1.0), &mut out);
        assert_eq!(out, vec![0, 1]);

        hash.query_neighbors(Vec2::new(100.0, 100.0), &mut out);
        assert!(out.is_empty(), "old contents should be gone after rebuild");
    }

    #[test]
    fn candidates_cover_everything_within_one_cell_size() {
        let mut rng = StdRng::seed_from_u64(42);
        let cell_size = 8.0;

        let points: Vec<Vec2> = (0..200)
            .map(|_| {
                Vec2::new(
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-50.0..50.0),
                )
            })
            .collect();

        let mut hash = SpatialHash::new(cell_size);
        hash.rebuild(&points);

        let mut out = Vec::new();
        for _ in 0..50 {
            let q = Vec2::new(
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
            );
            hash.query_neighbors(q, &mut out);

            // Any point at most one cell size away must be a candidate.
            for (i, &p) in points.iter().enumerate() {
                if p.distance(q) <= cell_size {
                    assert!(
                        out.contains(&i),
                        "point {:?} within {} of query {:?} missing from candidates",
                        p,
                        cell_size,
                        q
                    );
                }
            }

            // Filtering candidates by exact distance reproduces the
            // brute-force nearest neighbor for radii up to cell_size / 2.
            let radius = cell_size / 2.0;
            let brute = points
                .iter()
                .enumerate()
                .filter(|(_, p)| p.distance(q) <= radius)
                .min_by(|a, b| a.1.distance_squared(q).total_cmp(&b.1.distance_squared(q)))
                .map(|(i, _)| i);
            let filtered = out
                .iter()
                .copied()
                .filter(|&i| points[i].distance(q) <= radius)
                .min_by(|&a, &b| {
                    points[a]
                        .distance_squared(q)
                        .total_cmp(&points[b].distance_squared(q))
                });
            assert_eq!(filtered, brute);
        }
    }
}
