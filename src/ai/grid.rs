//! Walkability grid and breadth-first cell search
//!
//! Coarse alternative to the platform graph: the world is cut into square
//! cells, cells covered by a walkable platform are open, everything else is
//! blocked. Cells are addressed as `IVec2 { x: column, y: row }`.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::constants::{GRID_CELL_SIZE, GRID_MAX_CELLS_PER_AXIS};
use crate::levels::{Platform, PlatformRegistry};

/// Search order for neighbouring cells
const DIRECTIONS: [IVec2; 4] = [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y];

/// Walkability matrix over the world
#[derive(Clone, Debug)]
pub struct WalkGrid {
    pub cell_size: f32,
    pub rows: i32,
    pub cols: i32,
    /// Row-major, true = open
    open: Vec<bool>,
}

impl WalkGrid {
    /// Grid of `world_width` x `world_height` with every cell blocked.
    /// Each axis is capped at `GRID_MAX_CELLS_PER_AXIS` cells.
    pub fn blocked(world_width: f32, world_height: f32, cell_size: f32) -> Self {
        let cells = |extent: f32| {
            let wanted = (extent / cell_size).ceil();
            if wanted > GRID_MAX_CELLS_PER_AXIS as f32 {
                warn!(
                    "World extent {} needs {} cells, capping at {}",
                    extent, wanted, GRID_MAX_CELLS_PER_AXIS
                );
            }
            // NaN and negatives become 0
            wanted.clamp(0.0, GRID_MAX_CELLS_PER_AXIS as f32) as i32
        };
        let rows = cells(world_height);
        let cols = cells(world_width);
        Self {
            cell_size,
            rows,
            cols,
            open: vec![false; rows as usize * cols as usize],
        }
    }

    /// Mark every cell covered by a walkable platform as open
    pub fn build_matrix(platforms: &[Platform], world_width: f32, world_height: f32) -> Self {
        let mut grid = Self::blocked(world_width, world_height, GRID_CELL_SIZE);
        for platform in platforms.iter().filter(|p| p.walkable) {
            grid.open_platform(platform);
        }
        grid
    }

    pub fn from_registry(registry: &PlatformRegistry) -> Self {
        Self::build_matrix(
            &registry.platforms,
            registry.world_size.x,
            registry.world_size.y,
        )
    }

    fn open_platform(&mut self, platform: &Platform) {
        let bottom = platform.center.y + platform.height / 2.0;
        let start_col = (platform.left_x() / self.cell_size).floor() as i32;
        let end_col = ((platform.right_x() - 1.0) / self.cell_size).floor() as i32;
        let start_row = (platform.top_y() / self.cell_size).floor() as i32;
        let end_row = ((bottom - 1.0) / self.cell_size).floor() as i32;

        for row in start_row.max(0)..=end_row.min(self.rows - 1) {
            for col in start_col.max(0)..=end_col.min(self.cols - 1) {
                let index = self.index(IVec2::new(col, row));
                self.open[index] = true;
            }
        }
    }

    fn index(&self, cell: IVec2) -> usize {
        (cell.y * self.cols + cell.x) as usize
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.x < self.cols && cell.y >= 0 && cell.y < self.rows
    }

    pub fn is_open(&self, cell: IVec2) -> bool {
        self.in_bounds(cell) && self.open[self.index(cell)]
    }

    pub fn open_count(&self) -> usize {
        self.open.iter().filter(|&&o| o).count()
    }

    /// Cell containing a world point
    pub fn world_to_grid(&self, point: Vec2) -> IVec2 {
        IVec2::new(
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    /// World point at the center of a cell
    pub fn grid_to_world(&self, cell: IVec2) -> Vec2 {
        cell.as_vec2() * self.cell_size + Vec2::splat(self.cell_size / 2.0)
    }

    /// Unit-cost BFS between two cells through open cells.
    /// The result excludes `start` and ends with `goal`; it is empty when the
    /// goal is unreachable or equal to the start.
    pub fn find_grid_path(&self, start: IVec2, goal: IVec2) -> Vec<IVec2> {
        if start == goal || !self.in_bounds(start) || !self.is_open(goal) {
            return Vec::new();
        }

        let mut came_from: Vec<Option<IVec2>> = vec![None; self.open.len()];
        let mut visited = vec![false; self.open.len()];
        let mut queue = VecDeque::from([start]);
        visited[self.index(start)] = true;

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut path = vec![goal];
                let mut cell = goal;
                while let Some(parent) = came_from[self.index(cell)] {
                    if parent == start {
                        break;
                    }
                    path.push(parent);
                    cell = parent;
                }
                path.reverse();
                return path;
            }

            for dir in DIRECTIONS {
                let next = current + dir;
                if self.is_open(next) && !visited[self.index(next)] {
                    let index = self.index(next);
                    visited[index] = true;
                    came_from[index] = Some(current);
                    queue.push_back(next);
                }
            }
        }

        Vec::new()
    }

    /// Render as text rows (`.` open, `#` blocked)
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.cols + 1) * self.rows) as usize);
        for row in 0..self.rows {
            for col in 0..self.cols {
                out.push(if self.is_open(IVec2::new(col, row)) { '.' } else { '#' });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> WalkGrid {
        // 500 x 300 world: a floor along row 4 and a pillar up column 4
        let platforms = vec![
            Platform::new("platform-floor", Vec2::new(250.0, 225.0), 500.0, 50.0),
            Platform::new("platform-pillar", Vec2::new(225.0, 100.0), 50.0, 200.0),
            Platform::new("wall-block", Vec2::new(50.0, 50.0), 100.0, 100.0),
        ];
        WalkGrid::build_matrix(&platforms, 500.0, 300.0)
    }

    #[test]
    fn test_matrix_dimensions_round_up() {
        let grid = WalkGrid::build_matrix(&[], 3210.0, 2400.0);
        assert_eq!(grid.cols, 65);
        assert_eq!(grid.rows, 48);
        assert_eq!(grid.open_count(), 0);
    }

    #[test]
    fn test_huge_world_is_capped() {
        let platforms = vec![Platform::new("platform-floor", Vec2::new(1.0e9, 25.0), 2.0e9, 50.0)];
        let grid = WalkGrid::build_matrix(&platforms, 1.0e12, 1.0e12);
        assert_eq!(grid.cols, GRID_MAX_CELLS_PER_AXIS);
        assert_eq!(grid.rows, GRID_MAX_CELLS_PER_AXIS);
        // Floor spans every column of the first row
        assert_eq!(grid.open_count(), GRID_MAX_CELLS_PER_AXIS as usize);

        let degenerate = WalkGrid::build_matrix(&[], -100.0, f32::NAN);
        assert_eq!((degenerate.cols, degenerate.rows), (0, 0));
        assert_eq!(degenerate.open_count(), 0);
    }

    #[test]
    fn test_only_walkable_platforms_open_cells() {
        let grid = corridor();
        assert!(grid.is_open(IVec2::new(0, 4)));
        assert!(grid.is_open(IVec2::new(9, 4)));
        assert!(grid.is_open(IVec2::new(4, 0)));
        // wall-block is not walkable
        assert!(!grid.is_open(IVec2::new(0, 0)));
        assert!(!grid.is_open(IVec2::new(-1, 4)));
        assert_eq!(grid.open_count(), 10 + 4);
    }

    #[test]
    fn test_world_grid_conversion() {
        let grid = corridor();
        assert_eq!(grid.world_to_grid(Vec2::new(49.9, 50.0)), IVec2::new(0, 1));
        assert_eq!(grid.grid_to_world(IVec2::new(2, 3)), Vec2::new(125.0, 175.0));
    }

    #[test]
    fn test_grid_path_is_shortest_and_excludes_start() {
        let grid = corridor();
        let path = grid.find_grid_path(IVec2::new(0, 4), IVec2::new(4, 0));
        // 4 across then 4 up
        assert_eq!(path.len(), 8);
        assert_eq!(path[0], IVec2::new(1, 4));
        assert_eq!(*path.last().unwrap(), IVec2::new(4, 0));
        for pair in path.windows(2) {
            assert_eq!((pair[1] - pair[0]).abs().element_sum(), 1);
            assert!(grid.is_open(pair[1]));
        }
    }

    #[test]
    fn test_grid_path_empty_cases() {
        let grid = corridor();
        assert!(grid.find_grid_path(IVec2::new(0, 4), IVec2::new(0, 4)).is_empty());
        // Blocked goal
        assert!(grid.find_grid_path(IVec2::new(0, 4), IVec2::new(0, 0)).is_empty());
        // Open but disconnected goal
        let platforms = vec![
            Platform::new("platform-a", Vec2::new(25.0, 25.0), 50.0, 50.0),
            Platform::new("platform-b", Vec2::new(225.0, 25.0), 50.0, 50.0),
        ];
        let split = WalkGrid::build_matrix(&platforms, 250.0, 50.0);
        assert!(split.find_grid_path(IVec2::new(0, 0), IVec2::new(4, 0)).is_empty());
    }
}
