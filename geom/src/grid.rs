use std::collections::BTreeSet;

use crate::Bounds;

/// A uniform grid of buckets over a fixed area, for finding candidate pairs of things whose
/// bounding boxes might overlap. Things outside the covered area are clamped into the edge cells,
/// so lookups never miss anything; they just get less selective.
pub struct SpatialGrid<K> {
    bounds: Bounds,
    cell_width: f64,
    cell_height: f64,
    cols: usize,
    rows: usize,
    // Row-major
    cells: Vec<Vec<K>>,
}

impl<K: Copy + Ord> SpatialGrid<K> {
    /// Each axis gets `max(1, length / cell_size)` cells.
    pub fn new(bounds: &Bounds, cell_size: f64) -> SpatialGrid<K> {
        let cols = num_cells(bounds.width(), cell_size);
        let rows = num_cells(bounds.height(), cell_size);
        SpatialGrid {
            bounds: *bounds,
            cell_width: bounds.width() / (cols as f64),
            cell_height: bounds.height() / (rows as f64),
            cols,
            rows,
            cells: std::iter::repeat_with(Vec::new).take(cols * rows).collect(),
        }
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn insert(&mut self, key: K, bounds: &Bounds) {
        for idx in self.cells_touching(bounds) {
            self.cells[idx].push(key);
        }
    }

    /// Inserts the key into every cell the bounds touch, and returns everything inserted earlier
    /// into any of those cells. The result is sorted and never includes the key itself.
    pub fn insert_and_probe(&mut self, key: K, bounds: &Bounds) -> Vec<K> {
        let mut found = BTreeSet::new();
        for idx in self.cells_touching(bounds) {
            found.extend(self.cells[idx].iter().cloned());
            self.cells[idx].push(key);
        }
        found.remove(&key);
        found.into_iter().collect()
    }

    /// Everything in any cell the bounds touch, deduplicated and sorted.
    pub fn query(&self, bounds: &Bounds) -> Vec<K> {
        let mut found = BTreeSet::new();
        for idx in self.cells_touching(bounds) {
            found.extend(self.cells[idx].iter().cloned());
        }
        found.into_iter().collect()
    }

    fn cells_touching(&self, bounds: &Bounds) -> Vec<usize> {
        if bounds.is_empty() {
            return Vec::new();
        }
        let (x1, x2) = (self.col(bounds.min_x), self.col(bounds.max_x));
        let (z1, z2) = (self.row(bounds.min_z), self.row(bounds.max_z));
        let mut result = Vec::new();
        for z in z1..=z2 {
            for x in x1..=x2 {
                result.push(z * self.cols + x);
            }
        }
        result
    }

    fn col(&self, x: f64) -> usize {
        clamp_cell((x - self.bounds.min_x) / self.cell_width, self.cols)
    }

    fn row(&self, z: f64) -> usize {
        clamp_cell((z - self.bounds.min_z) / self.cell_height, self.rows)
    }
}

fn num_cells(length: f64, cell_size: f64) -> usize {
    if !(length > 0.0) || !(cell_size > 0.0) {
        return 1;
    }
    ((length / cell_size) as usize).max(1)
}

fn clamp_cell(pos: f64, count: usize) -> usize {
    // NaN (from a zero-sized grid) lands in the first cell
    if !(pos > 0.0) {
        return 0;
    }
    (pos as usize).min(count - 1)
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;

    #[test]
    fn cell_counts() {
        let grid: SpatialGrid<usize> =
            SpatialGrid::new(&Bounds::from_corners(0.0, 0.0, 2500.0, 500.0), 1000.0);
        assert_eq!(grid.num_cells(), 2);
        let tiny: SpatialGrid<usize> =
            SpatialGrid::new(&Bounds::from_corners(0.0, 0.0, 0.0, 0.0), 1000.0);
        assert_eq!(tiny.num_cells(), 1);
    }

    #[test]
    fn probe_returns_earlier_neighbors() {
        let mut grid = SpatialGrid::new(&Bounds::from_corners(0.0, 0.0, 100.0, 100.0), 10.0);
        assert!(grid
            .insert_and_probe(1, &Bounds::from_corners(1.0, 1.0, 5.0, 5.0))
            .is_empty());
        assert!(grid
            .insert_and_probe(2, &Bounds::from_corners(50.0, 50.0, 55.0, 55.0))
            .is_empty());
        // Spans both, and sticks out of the grid
        assert_eq!(
            grid.insert_and_probe(3, &Bounds::from_corners(-20.0, -20.0, 52.0, 52.0)),
            vec![1, 2]
        );
        assert_eq!(
            grid.query(&Bounds::from_corners(200.0, 200.0, 300.0, 300.0)),
            Vec::<usize>::new()
        );
        assert_eq!(grid.query(&Bounds::from_corners(0.0, 0.0, 1.0, 1.0)), vec![1, 3]);
    }

    #[test]
    fn no_false_negatives() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        let all: Vec<Bounds> = (0..300)
            .map(|_| {
                let x = rng.gen_range(-100.0..1100.0);
                let z = rng.gen_range(-100.0..1100.0);
                let w = rng.gen_range(0.0..80.0);
                let h = rng.gen_range(0.0..80.0);
                Bounds::from_corners(x, z, x + w, z + h)
            })
            .collect();

        let mut grid = SpatialGrid::new(&Bounds::from_corners(0.0, 0.0, 1000.0, 1000.0), 50.0);
        for (idx, b) in all.iter().enumerate() {
            let found = grid.insert_and_probe(idx, b);
            for (other, other_b) in all.iter().enumerate().take(idx) {
                if b.intersects(other_b) {
                    assert!(found.contains(&other), "{} should see {}", idx, other);
                }
            }
        }
    }
}
