//! Grid cells and the enemy path
//!
//! The grid is a flat row-major arena. Path membership and tower occupancy are
//! stored separately; placement checks both.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell coordinate as a point (cell units)
    #[inline]
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// The eight surrounding cells (may be out of bounds)
    pub fn neighbors(&self) -> impl Iterator<Item = Cell> + '_ {
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| Cell::new(self.x + dx, self.y + dy))
    }
}

/// The fixed polyline enemies walk along
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    vertices: Vec<Cell>,
}

impl Path {
    pub fn new(vertices: Vec<Cell>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Cell] {
        &self.vertices
    }

    /// Number of segments (vertices - 1)
    pub fn segment_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    pub fn is_last_segment(&self, index: usize) -> bool {
        index + 1 >= self.segment_count()
    }

    /// Length of the segment starting at vertex `index` (0 when out of range)
    pub fn segment_length(&self, index: usize) -> f32 {
        match (self.vertices.get(index), self.vertices.get(index + 1)) {
            (Some(a), Some(b)) => a.as_vec2().distance(b.as_vec2()),
            _ => 0.0,
        }
    }

    /// Interpolated point `progress` of the way along segment `index`
    pub fn point_at(&self, index: usize, progress: f32) -> Vec2 {
        match (self.vertices.get(index), self.vertices.get(index + 1)) {
            (Some(a), Some(b)) => a.as_vec2().lerp(b.as_vec2(), progress),
            (Some(a), None) => a.as_vec2(),
            _ => Vec2::ZERO,
        }
    }

    /// Every cell the path covers, vertices included, in traversal order
    pub fn covered_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        if let Some(first) = self.vertices.first() {
            cells.push(*first);
        }
        for pair in self.vertices.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            let steps = dx.abs().max(dy.abs());
            for k in 1..=steps {
                let t = k as f32 / steps as f32;
                let cell = Cell::new(
                    a.x + (dx as f32 * t).round() as i32,
                    a.y + (dy as f32 * t).round() as i32,
                );
                if cells.last() != Some(&cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

/// Spatial index of path cells and tower occupancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    path_mask: Vec<bool>,
    /// Tower id per cell
    towers: Vec<Option<u32>>,
}

impl Grid {
    /// Build the grid and mark every cell the path covers
    pub fn new(config: &GameConfig, path: &Path) -> Self {
        let size = config.grid_width as usize * config.grid_height as usize;
        let mut grid = Self {
            width: config.grid_width,
            height: config.grid_height,
            path_mask: vec![false; size],
            towers: vec![None; size],
        };
        for cell in path.covered_cells() {
            if let Some(i) = grid.index(cell) {
                grid.path_mask[i] = true;
            }
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Flat index for a cell, `None` when out of bounds
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as u32, cell.y as u32);
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.index(cell).is_some()
    }

    pub fn is_path(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.path_mask[i])
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.tower_at(cell).is_some()
    }

    /// In bounds, off the path and empty
    pub fn is_buildable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.is_path(cell) && !self.is_occupied(cell)
    }

    pub fn tower_at(&self, cell: Cell) -> Option<u32> {
        self.index(cell).and_then(|i| self.towers[i])
    }

    /// Occupy a buildable cell. Returns false without changes otherwise.
    pub fn set_tower(&mut self, cell: Cell, tower_id: u32) -> bool {
        if !self.is_buildable(cell) {
            return false;
        }
        match self.index(cell) {
            Some(i) => {
                self.towers[i] = Some(tower_id);
                true
            }
            None => false,
        }
    }

    /// Clear a cell, returning the tower id that was there
    pub fn clear_tower(&mut self, cell: Cell) -> Option<u32> {
        let i = self.index(cell)?;
        self.towers[i].take()
    }

    /// All path cells in row-major order
    pub fn path_cells(&self) -> Vec<Cell> {
        self.path_mask
            .iter()
            .enumerate()
            .filter(|&(_, on_path)| *on_path)
            .map(|(i, _)| {
                let width = self.width as usize;
                Cell::new((i % width) as i32, (i / width) as i32)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_grid() -> (Grid, Path) {
        let config = GameConfig::default();
        let path = Path::new(config.path.clone());
        (Grid::new(&config, &path), path)
    }

    #[test]
    fn test_path_covers_segments_not_just_vertices() {
        let (grid, _) = default_grid();
        assert!(grid.is_path(Cell::new(0, 3)));
        assert!(grid.is_path(Cell::new(1, 3)));
        assert!(grid.is_path(Cell::new(3, 4)));
        assert!(grid.is_path(Cell::new(5, 5)));
        assert!(grid.is_path(Cell::new(7, 3)));
        assert!(grid.is_path(Cell::new(11, 2)));
        assert!(!grid.is_path(Cell::new(0, 0)));
        assert!(!grid.is_path(Cell::new(4, 4)));
    }

    #[test]
    fn test_covered_cells_count() {
        let (_, path) = default_grid();
        // 1 + 3 + 2 + 4 + 3 + 4
        assert_eq!(path.covered_cells().len(), 17);
    }

    #[test]
    fn test_out_of_bounds_is_no_cell() {
        let (grid, _) = default_grid();
        assert!(!grid.in_bounds(Cell::new(-1, 0)));
        assert!(!grid.in_bounds(Cell::new(12, 0)));
        assert!(!grid.is_path(Cell::new(0, 8)));
        assert_eq!(grid.tower_at(Cell::new(99, 99)), None);
    }

    #[test]
    fn test_occupancy_independent_of_path() {
        let (mut grid, _) = default_grid();
        assert!(!grid.set_tower(Cell::new(1, 3), 1));
        assert!(!grid.is_occupied(Cell::new(1, 3)));

        assert!(grid.set_tower(Cell::new(1, 1), 7));
        assert_eq!(grid.tower_at(Cell::new(1, 1)), Some(7));
        assert!(!grid.set_tower(Cell::new(1, 1), 8));
        assert_eq!(grid.clear_tower(Cell::new(1, 1)), Some(7));
        assert!(grid.is_buildable(Cell::new(1, 1)));
    }

    #[test]
    fn test_segment_geometry() {
        let (_, path) = default_grid();
        assert_eq!(path.segment_count(), 5);
        assert_eq!(path.segment_length(0), 3.0);
        assert_eq!(path.segment_length(1), 2.0);
        assert_eq!(path.segment_length(5), 0.0);
        assert!(path.is_last_segment(4));
        assert!(!path.is_last_segment(3));
        assert_eq!(path.point_at(0, 0.5), Vec2::new(1.5, 3.0));
    }

    #[test]
    fn test_neighbors() {
        let n: Vec<Cell> = Cell::new(0, 0).neighbors().collect();
        assert_eq!(n.len(), 8);
        assert!(!n.contains(&Cell::new(0, 0)));
        assert!(n.contains(&Cell::new(-1, -1)));
        assert!(n.contains(&Cell::new(1, 1)));
    }
}
