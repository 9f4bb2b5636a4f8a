//! Point-to-point shortest path search over path terrain.

use rampart_core::{CellCoord, Direction};
use tracing::trace;

use crate::{
    grid::Grid,
    search::{neighbor_index, SearchScratch},
};

/// Identity of a cached search result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PathCacheKey {
    start: CellCoord,
    end: CellCoord,
    columns: u32,
    rows: u32,
    version: u64,
}

impl PathCacheKey {
    fn new(grid: &Grid, start: CellCoord, end: CellCoord) -> Self {
        Self {
            start,
            end,
            columns: grid.columns(),
            rows: grid.rows(),
            version: grid.version(),
        }
    }
}

#[derive(Clone, Debug)]
struct PathCache {
    key: PathCacheKey,
    points: Vec<CellCoord>,
}

/// Breadth-first shortest path solver with a single-entry result cache.
///
/// Only [`rampart_core::TerrainKind::Path`] cells are traversed. Neighbors are
/// expanded up, right, down, left, so identical inputs always produce the same
/// route. Successful results are memoised against the grid shape and version;
/// failed searches are not cached and repeat on the next call.
#[derive(Clone, Debug, Default)]
pub struct Pathfinder {
    scratch: SearchScratch,
    cache: Option<PathCache>,
    searches: u64,
}

impl Pathfinder {
    /// Creates a solver with empty scratch buffers and no cached result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the shortest route from `start` to `end`, inclusive of both.
    ///
    /// Returns an empty route when either endpoint lies outside of the grid or
    /// off path terrain, or when no route connects them.
    pub fn find_path(&mut self, grid: &Grid, start: CellCoord, end: CellCoord) -> Vec<CellCoord> {
        let key = PathCacheKey::new(grid, start, end);
        if let Some(cache) = &self.cache {
            if cache.key == key {
                return cache.points.clone();
            }
        }

        let (Some(start_index), Some(end_index)) = (grid.index(start), grid.index(end)) else {
            return Vec::new();
        };
        if !grid.is_walkable_at(start_index) || !grid.is_walkable_at(end_index) {
            return Vec::new();
        }

        self.searches += 1;
        let points = self.search(grid, start_index, end_index);
        trace!(
            ?start,
            ?end,
            length = points.len(),
            version = grid.version(),
            "path search finished"
        );

        if !points.is_empty() {
            self.cache = Some(PathCache {
                key,
                points: points.clone(),
            });
        }

        points
    }

    /// Drops the cached result.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Number of searches that actually ran, excluding cache hits.
    #[must_use]
    pub const fn searches(&self) -> u64 {
        self.searches
    }

    fn search(&mut self, grid: &Grid, start_index: usize, end_index: usize) -> Vec<CellCoord> {
        let columns = usize::try_from(grid.columns()).unwrap_or(0);
        let rows = usize::try_from(grid.rows()).unwrap_or(0);

        self.scratch.begin(grid.cell_count());
        self.scratch.discover_root(start_index);

        let mut reached = false;
        while let Some(current) = self.scratch.pop() {
            if current == end_index {
                reached = true;
                break;
            }

            for direction in Direction::SEARCH_ORDER {
                let Some(neighbor) = neighbor_index(current, direction, columns, rows) else {
                    continue;
                };
                if !grid.is_walkable_at(neighbor) {
                    continue;
                }
                self.scratch.discover(neighbor, current);
            }
        }

        if !reached {
            return Vec::new();
        }

        let mut points = Vec::new();
        let mut cursor = Some(end_index);
        while let Some(index) = cursor {
            if let Some(cell) = grid.coord_at(index) {
                points.push(cell);
            }
            if index == start_index {
                break;
            }
            cursor = self.scratch.parent(index);
        }
        points.reverse();
        points
    }
}
