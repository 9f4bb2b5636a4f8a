//! Flow field builder that steers agents toward the single route target.

use std::collections::VecDeque;

use glam::Vec2;
use rampart_core::{CellCoord, Direction, NavigationConfig};

use crate::{
    grid::Grid,
    search::{neighbor_index, SearchScratch},
};

/// Distance stored for cells that cannot reach the target.
pub const UNREACHABLE: i32 = -1;

/// Discrete cardinal step stored per cell of the vector field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StepVector {
    dx: i8,
    dy: i8,
}

impl StepVector {
    /// Vector stored for unreachable and target cells.
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    /// Unit step in the provided direction.
    #[must_use]
    pub const fn toward(direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self { dx, dy }
    }

    /// Column component of the step.
    #[must_use]
    pub const fn dx(&self) -> i8 {
        self.dx
    }

    /// Row component of the step.
    #[must_use]
    pub const fn dy(&self) -> i8 {
        self.dy
    }

    /// Reports whether the vector stands still.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Direction the step points to, if it moves at all.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        match (self.dx, self.dy) {
            (0, -1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Steering {
    tile_size: f32,
    centering_threshold: f32,
    centering_gain: f32,
    normalization_tolerance: f32,
}

impl From<&NavigationConfig> for Steering {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            tile_size: config.tile_size,
            centering_threshold: config.centering_threshold,
            centering_gain: config.centering_gain,
            normalization_tolerance: config.normalization_tolerance,
        }
    }
}

/// Dense distance and vector fields seeded from a single target cell.
///
/// Distances are exact hop counts across path terrain, `-1` marks cells that
/// cannot reach the target. Each reachable cell stores a unit cardinal step
/// toward the neighbor with the smallest distance, ties resolved up, right,
/// down, left. Until [`FlowField::generate`] runs for the current grid shape
/// every distance reads `-1` and every vector reads zero.
#[derive(Clone, Debug)]
pub struct FlowField {
    columns: u32,
    rows: u32,
    distances: Vec<i32>,
    vectors: Vec<StepVector>,
    queue: VecDeque<usize>,
    target: Option<CellCoord>,
    generations: u64,
    connectivity: SearchScratch,
    steering: Steering,
}

impl FlowField {
    /// Creates an empty field using the steering parameters of `config`.
    #[must_use]
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            columns: 0,
            rows: 0,
            distances: Vec::new(),
            vectors: Vec::new(),
            queue: VecDeque::new(),
            target: None,
            generations: 0,
            connectivity: SearchScratch::new(),
            steering: Steering::from(config),
        }
    }

    /// Replaces the steering parameters without touching the fields.
    pub fn configure(&mut self, config: &NavigationConfig) {
        self.steering = Steering::from(config);
    }

    /// Discards the fields and sizes the buffers for a `columns` x `rows` grid.
    ///
    /// Buffers are reallocated only when the shape changes.
    pub fn reset(&mut self, columns: u32, rows: u32) {
        let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        if self.columns != columns || self.rows != rows || self.distances.len() != cell_count {
            self.distances = vec![UNREACHABLE; cell_count];
            self.vectors = vec![StepVector::ZERO; cell_count];
            self.columns = columns;
            self.rows = rows;
        } else {
            self.distances.fill(UNREACHABLE);
            self.vectors.fill(StepVector::ZERO);
        }
        self.target = None;
    }

    /// Recomputes both fields for the whole grid relative to `target`.
    ///
    /// The target is seeded at distance zero whatever its terrain; expansion
    /// from it only crosses path cells. A target outside of the grid leaves
    /// every cell unreachable.
    pub fn generate(&mut self, grid: &Grid, target: CellCoord) {
        self.reset(grid.columns(), grid.rows());
        self.generations += 1;

        let Some(target_index) = grid.index(target) else {
            return;
        };
        self.target = Some(target);

        let columns = usize::try_from(self.columns).unwrap_or(0);
        let rows = usize::try_from(self.rows).unwrap_or(0);

        self.queue.clear();
        self.distances[target_index] = 0;
        self.queue.push_back(target_index);

        while let Some(current) = self.queue.pop_front() {
            let next_distance = self.distances[current] + 1;
            for direction in Direction::SEARCH_ORDER {
                let Some(neighbor) = neighbor_index(current, direction, columns, rows) else {
                    continue;
                };
                if self.distances[neighbor] != UNREACHABLE || !grid.is_walkable_at(neighbor) {
                    continue;
                }

                self.distances[neighbor] = next_distance;
                self.queue.push_back(neighbor);
            }
        }

        for index in 0..self.distances.len() {
            let distance = self.distances[index];
            if distance <= 0 {
                continue;
            }

            let mut best: Option<(i32, Direction)> = None;
            for direction in Direction::SEARCH_ORDER {
                let Some(neighbor) = neighbor_index(index, direction, columns, rows) else {
                    continue;
                };
                let candidate = self.distances[neighbor];
                if candidate == UNREACHABLE || candidate >= distance {
                    continue;
                }
                if best.map_or(true, |(lowest, _)| candidate < lowest) {
                    best = Some((candidate, direction));
                }
            }

            if let Some((_, direction)) = best {
                self.vectors[index] = StepVector::toward(direction);
            }
        }
    }

    /// Steering direction for an agent at a continuous world position.
    ///
    /// The agent follows the stored cardinal step, nudged back toward the
    /// centerline of its tile on the axis perpendicular to travel once the
    /// offset exceeds the configured threshold. Positions outside of the grid,
    /// on unreachable cells or on the target itself steer to zero.
    #[must_use]
    pub fn get_vector(&self, position: Vec2) -> Vec2 {
        let tile_size = self.steering.tile_size;
        if !position.is_finite() || tile_size <= 0.0 || position.x < 0.0 || position.y < 0.0 {
            return Vec2::ZERO;
        }

        let column = (position.x / tile_size).floor() as u32;
        let row = (position.y / tile_size).floor() as u32;
        let step = self.vector(CellCoord::new(column, row));
        if step.is_zero() {
            return Vec2::ZERO;
        }

        let mut steer = Vec2::new(f32::from(step.dx), f32::from(step.dy));
        let center = Vec2::new(
            (column as f32 + 0.5) * tile_size,
            (row as f32 + 0.5) * tile_size,
        );
        let threshold = self.steering.centering_threshold * tile_size;

        if step.dx != 0 {
            let offset = position.y - center.y;
            if offset.abs() > threshold {
                steer.y -= offset / tile_size * self.steering.centering_gain;
            }
        } else {
            let offset = position.x - center.x;
            if offset.abs() > threshold {
                steer.x -= offset / tile_size * self.steering.centering_gain;
            }
        }

        if (steer.length() - 1.0).abs() > self.steering.normalization_tolerance {
            steer = steer.normalize_or_zero();
        }
        steer
    }

    /// Reports whether any spawn still reaches the target with `proposed`
    /// treated as impassable.
    ///
    /// Uses its own visited buffers, so it never disturbs the generated
    /// fields. Returns `false` before the first [`FlowField::generate`] call
    /// and when `proposed` is the target itself.
    pub fn check_buildability(
        &mut self,
        grid: &Grid,
        proposed: CellCoord,
        spawns: &[CellCoord],
    ) -> bool {
        let Some(target_index) = self.target.and_then(|target| grid.index(target)) else {
            return false;
        };
        let blocked = grid.index(proposed);
        if blocked == Some(target_index) {
            return false;
        }

        let columns = usize::try_from(grid.columns()).unwrap_or(0);
        let rows = usize::try_from(grid.rows()).unwrap_or(0);
        let passable =
            |index: usize| Some(index) != blocked && (index == target_index || grid.is_walkable_at(index));

        self.connectivity.begin(grid.cell_count());
        for spawn in spawns {
            if let Some(index) = grid.index(*spawn) {
                if passable(index) {
                    self.connectivity.discover_root(index);
                }
            }
        }

        while let Some(current) = self.connectivity.pop() {
            if current == target_index {
                return true;
            }

            for direction in Direction::SEARCH_ORDER {
                let Some(neighbor) = neighbor_index(current, direction, columns, rows) else {
                    continue;
                };
                if passable(neighbor) {
                    self.connectivity.discover(neighbor, current);
                }
            }
        }

        false
    }

    /// Distance from the cell to the target, `-1` when unreachable or unknown.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> i32 {
        self.index(cell)
            .and_then(|index| self.distances.get(index).copied())
            .unwrap_or(UNREACHABLE)
    }

    /// Cardinal step stored for the cell, zero when unreachable or unknown.
    #[must_use]
    pub fn vector(&self, cell: CellCoord) -> StepVector {
        self.index(cell)
            .and_then(|index| self.vectors.get(index).copied())
            .unwrap_or(StepVector::ZERO)
    }

    /// Dense distances stored in row-major order.
    #[must_use]
    pub fn distances(&self) -> &[i32] {
        &self.distances
    }

    /// Dense vectors stored in row-major order.
    #[must_use]
    pub fn vectors(&self) -> &[StepVector] {
        &self.vectors
    }

    /// Target the fields were generated for.
    #[must_use]
    pub const fn target(&self) -> Option<CellCoord> {
        self.target
    }

    /// Reports whether the fields reflect a generated target.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.target.is_some()
    }

    /// Number of completed [`FlowField::generate`] calls.
    #[must_use]
    pub const fn generations(&self) -> u64 {
        self.generations
    }

    /// Width of the field in cells.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Height of the field in cells.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }

        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

impl Default for FlowField {
    fn default() -> Self {
        Self::new(&NavigationConfig::default())
    }
}
