//! Blocked cells and collision-aware projection
//!
//! Obstacles are whole grid cells kept in a hash set. Destinations are
//! projected along a ray and pulled back in front of the first blocked cell.

use ahash::AHashSet;
use glam::Vec2;

/// Fraction of a cell advanced per ray-march step
const STEPS_PER_CELL: f32 = 8.0;

/// Set of blocked grid cells
#[derive(Debug, Clone)]
pub struct CollisionMap {
    cells: AHashSet<(i32, i32)>,
    cell_size: f32,
}

impl CollisionMap {
    /// Create an empty map with a cell size of 1.0
    pub fn new() -> Self {
        Self::with_cell_size(1.0)
    }

    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            cells: AHashSet::new(),
            cell_size,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn block(&mut self, x: i32, y: i32) {
        self.cells.insert((x, y));
    }

    pub fn unblock(&mut self, x: i32, y: i32) {
        self.cells.remove(&(x, y));
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.cells.contains(&(x, y))
    }

    pub fn is_position_blocked(&self, pos: Vec2) -> bool {
        let (cx, cy) = self.world_to_cell(pos);
        self.is_blocked(cx, cy)
    }

    /// Convert world position to cell coordinates
    pub fn world_to_cell(&self, pos: Vec2) -> (i32, i32) {
        let x = (pos.x / self.cell_size).floor() as i32;
        let y = (pos.y / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Block every cell of the inclusive rectangle between two corners
    pub fn block_rect(&mut self, min: (i32, i32), max: (i32, i32)) {
        for y in min.1..=max.1 {
            for x in min.0..=max.0 {
                self.block(x, y);
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Point `distance` away from `origin` along the absolute `angle`,
    /// stopped in front of the first blocked cell on the way
    ///
    /// A blocked origin yields the origin itself. Non-positive or non-finite
    /// distances do not move.
    pub fn move_position_to_first_collision(&self, origin: Vec2, distance: f32, angle: f32) -> Vec2 {
        if !distance.is_finite() || distance <= 0.0 {
            return origin;
        }

        let direction = Vec2::new(angle.cos(), angle.sin());
        let target = origin + direction * distance;
        if self.cells.is_empty() {
            return target;
        }
        if self.is_position_blocked(origin) {
            return origin;
        }

        let step = self.cell_size / STEPS_PER_CELL;
        let mut travelled = 0.0;
        let mut last_free = origin;
        while travelled < distance {
            travelled = (travelled + step).min(distance);
            let sample = origin + direction * travelled;
            if self.is_position_blocked(sample) {
                return last_free;
            }
            last_free = sample;
        }

        target
    }
}

impl Default for CollisionMap {
    fn default() -> Self {
        Self::new()
    }
}
