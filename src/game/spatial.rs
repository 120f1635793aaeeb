//! Spatial hash grid for target lookups
//!
//! Divides the playfield into cells and buckets live targets by center.
//! Rebuilt from scratch once per frame, then queried by the collision and
//! splash stages. Queries return candidates only; precise circle tests are
//! the caller's job.

use crate::game::constants::grid;
use crate::game::state::HostileId;
use crate::util::vec2::Vec2;
use hashbrown::HashMap;
use serde::Serialize;

/// Grid cell key - (x, y) cell coordinates
pub type CellKey = (i32, i32);

/// Target data stored in the grid
#[derive(Debug, Clone, Copy)]
pub struct GridEntry {
    pub id: HostileId,
    pub position: Vec2,
    pub radius: f32,
}

/// Uniform spatial hash grid over target centers
///
/// Cell size should be roughly 2x the maximum target radius so a circle
/// test never needs candidates from beyond the one-cell margin the queries
/// already include.
#[derive(Debug, Clone)]
pub struct TargetGrid {
    /// Cell size in world units
    cell_size: f32,
    /// Inverse cell size for fast position-to-cell conversion
    inv_cell_size: f32,
    /// Map from cell key to targets bucketed in that cell
    cells: HashMap<CellKey, Vec<GridEntry>>,
}

impl TargetGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::with_capacity(grid::INITIAL_CELLS),
        }
    }

    /// Clear all targets, keeping cell allocations for the next rebuild
    #[inline]
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    /// Convert world position to cell key
    #[inline]
    fn position_to_cell(&self, position: Vec2) -> CellKey {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }

    /// Insert a target into the grid
    #[inline]
    pub fn insert(&mut self, id: HostileId, position: Vec2, radius: f32) {
        let cell_key = self.position_to_cell(position);
        self.cells
            .entry(cell_key)
            .or_insert_with(|| Vec::with_capacity(grid::CELL_CAPACITY))
            .push(GridEntry {
                id,
                position,
                radius,
            });
    }

    /// Rebuild the grid from the live target set
    pub fn rebuild(&mut self, targets: impl Iterator<Item = (HostileId, Vec2, f32)>) {
        self.clear();
        for (id, position, radius) in targets {
            self.insert(id, position, radius);
        }
    }

    /// All targets in cells overlapping a disc around `position`.
    ///
    /// Walks the cell rectangle covering the radius plus a one-cell margin,
    /// so targets bucketed by center in an adjacent cell are still found.
    /// For radii up to one cell this is the 3x3 neighborhood.
    pub fn query_radius(&self, position: Vec2, radius: f32) -> impl Iterator<Item = &GridEntry> {
        let (cx, cy) = self.position_to_cell(position);
        let cell_radius = (radius * self.inv_cell_size).ceil() as i32 + 1;

        (-cell_radius..=cell_radius).flat_map(move |dx| {
            (-cell_radius..=cell_radius).flat_map(move |dy| {
                let cell_key = (cx + dx, cy + dy);
                self.cells
                    .get(&cell_key)
                    .into_iter()
                    .flat_map(|cell| cell.iter())
            })
        })
    }

    /// All targets in cells overlapping the swept segment `p0 -> p1`,
    /// inflated by `pad` (the moving circle's radius) plus a one-cell
    /// margin for target radii. Candidate source for swept collision tests;
    /// a zero-length segment degenerates to a point query.
    pub fn query_segment(
        &self,
        p0: Vec2,
        p1: Vec2,
        pad: f32,
    ) -> impl Iterator<Item = &GridEntry> {
        let min_x = p0.x.min(p1.x) - pad;
        let min_y = p0.y.min(p1.y) - pad;
        let max_x = p0.x.max(p1.x) + pad;
        let max_y = p0.y.max(p1.y) + pad;

        let (cx0, cy0) = self.position_to_cell(Vec2::new(min_x, min_y));
        let (cx1, cy1) = self.position_to_cell(Vec2::new(max_x, max_y));

        ((cx0 - 1)..=(cx1 + 1)).flat_map(move |cx| {
            ((cy0 - 1)..=(cy1 + 1)).flat_map(move |cy| {
                self.cells
                    .get(&(cx, cy))
                    .into_iter()
                    .flat_map(|cell| cell.iter())
            })
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Get statistics about the grid
    pub fn stats(&self) -> GridStats {
        let non_empty_cells = self.cells.values().filter(|c| !c.is_empty()).count();
        let total_entries: usize = self.cells.values().map(|c| c.len()).sum();
        let max_per_cell = self.cells.values().map(|c| c.len()).max().unwrap_or(0);

        GridStats {
            non_empty_cells,
            total_entries,
            max_per_cell,
        }
    }
}

impl Default for TargetGrid {
    fn default() -> Self {
        Self::new(grid::CELL_SIZE)
    }
}

/// Statistics about the spatial grid
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GridStats {
    pub non_empty_cells: usize,
    pub total_entries: usize,
    pub max_per_cell: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> HostileId {
        HostileId(raw)
    }

    #[test]
    fn test_insert_and_query() {
        let mut grid = TargetGrid::new(64.0);
        grid.insert(id(1), Vec2::new(100.0, 100.0), 10.0);

        let results: Vec<_> = grid.query_radius(Vec2::new(100.0, 100.0), 20.0).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id(1));
    }

    #[test]
    fn test_query_finds_neighbor_cells() {
        let mut grid = TargetGrid::new(64.0);
        // Cell (1, 1) and its right neighbor (2, 1)
        grid.insert(id(1), Vec2::new(80.0, 80.0), 10.0);
        grid.insert(id(2), Vec2::new(130.0, 80.0), 10.0);

        let results: Vec<_> = grid.query_radius(Vec2::new(80.0, 80.0), 30.0).collect();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_query_radius_grows_with_radius() {
        let mut grid = TargetGrid::new(64.0);
        grid.insert(id(1), Vec2::ZERO, 10.0);
        grid.insert(id(2), Vec2::new(300.0, 0.0), 10.0);

        let near: Vec<_> = grid.query_radius(Vec2::ZERO, 30.0).collect();
        assert_eq!(near.len(), 1);

        let wide: Vec<_> = grid.query_radius(Vec2::ZERO, 320.0).collect();
        assert_eq!(wide.len(), 2);
    }

    #[test]
    fn test_query_segment_covers_full_path() {
        let mut grid = TargetGrid::new(64.0);
        // Targets spread along a long horizontal path
        grid.insert(id(1), Vec2::new(50.0, 100.0), 10.0);
        grid.insert(id(2), Vec2::new(300.0, 100.0), 10.0);
        grid.insert(id(3), Vec2::new(550.0, 100.0), 10.0);
        // Far off the path
        grid.insert(id(4), Vec2::new(300.0, 500.0), 10.0);

        let results: Vec<_> = grid
            .query_segment(Vec2::new(0.0, 100.0), Vec2::new(600.0, 100.0), 5.0)
            .collect();
        let ids: Vec<_> = results.iter().map(|e| e.id).collect();
        assert!(ids.contains(&id(1)));
        assert!(ids.contains(&id(2)));
        assert!(ids.contains(&id(3)));
        assert!(!ids.contains(&id(4)));
    }

    #[test]
    fn test_query_segment_zero_length() {
        let mut grid = TargetGrid::new(64.0);
        grid.insert(id(1), Vec2::new(100.0, 100.0), 10.0);

        let p = Vec2::new(100.0, 100.0);
        let results: Vec<_> = grid.query_segment(p, p, 5.0).collect();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut grid = TargetGrid::new(64.0);
        grid.insert(id(1), Vec2::new(100.0, 100.0), 10.0);
        grid.clear();

        let results: Vec<_> = grid.query_radius(Vec2::new(100.0, 100.0), 50.0).collect();
        assert!(results.is_empty());
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut grid = TargetGrid::new(64.0);
        grid.insert(id(1), Vec2::ZERO, 10.0);

        grid.rebuild([(id(5), Vec2::new(10.0, 10.0), 8.0)].into_iter());

        let results: Vec<_> = grid.query_radius(Vec2::ZERO, 30.0).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id(5));
    }

    #[test]
    fn test_empty_grid_queries_are_empty() {
        let grid = TargetGrid::default();
        assert_eq!(grid.query_radius(Vec2::ZERO, 100.0).count(), 0);
        assert_eq!(
            grid.query_segment(Vec2::ZERO, Vec2::new(500.0, 0.0), 5.0)
                .count(),
            0
        );
    }

    #[test]
    fn test_stats() {
        let mut grid = TargetGrid::new(64.0);
        for i in 0..3 {
            grid.insert(id(i), Vec2::new(100.0, 100.0), 10.0);
        }
        grid.insert(id(9), Vec2::new(500.0, 500.0), 10.0);

        let stats = grid.stats();
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.non_empty_cells, 2);
        assert_eq!(stats.max_per_cell, 3);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = TargetGrid::new(64.0);
        grid.insert(id(1), Vec2::new(-100.0, -100.0), 10.0);

        let results: Vec<_> = grid.query_radius(Vec2::new(-100.0, -100.0), 20.0).collect();
        assert_eq!(results.len(), 1);
    }
}
