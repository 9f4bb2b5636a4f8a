#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative map state and navigation coordination for Rampart.
//!
//! The [`MapManager`] owns the terrain grid, the placed obstacles and the
//! navigation engine built on top of them. Mutations arrive through
//! [`apply`]; read-only access goes through [`query`]. Terrain edits only mark
//! navigation dirty, and the next [`Command::Tick`] regenerates the flow field
//! before anything else in the tick observes it.

mod flow_field;
mod grid;
mod pathfinder;
mod search;

use std::collections::HashSet;

use rampart_core::{
    BuildRejection, CellCoord, Command, Event, MapData, NavigationConfig, ObstacleId,
    RemovalError, ValidationErrorKind, ValidationIssue, WaypointsMode,
};
use tracing::{debug, info, warn};

pub use flow_field::{FlowField, StepVector, UNREACHABLE};
pub use grid::{Cell, Grid};
pub use pathfinder::Pathfinder;

/// Dirty flag paired with the grid version the navigation data reflects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationRevision {
    dirty: bool,
    built_version: Option<u64>,
}

impl NavigationRevision {
    /// Flags the navigation data as stale.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Records a completed rebuild against `version`.
    pub fn mark_built(&mut self, version: u64) {
        self.dirty = false;
        self.built_version = Some(version);
    }

    /// Reports whether a rebuild is pending.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Grid version the navigation data was last rebuilt from.
    #[must_use]
    pub const fn built_version(&self) -> Option<u64> {
        self.built_version
    }
}

/// Represents the authoritative map and its navigation state.
#[derive(Debug)]
pub struct MapManager {
    grid: Grid,
    config: NavigationConfig,
    revision: NavigationRevision,
    pathfinder: Pathfinder,
    flow_field: FlowField,
    waypoints: Vec<CellCoord>,
    waypoints_mode: WaypointsMode,
    route: Vec<CellCoord>,
    obstacles: ObstacleGrid,
    next_obstacle: u32,
}

impl MapManager {
    /// Creates an empty map using the default navigation configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(NavigationConfig::default())
    }

    /// Creates an empty map using the provided navigation configuration.
    #[must_use]
    pub fn with_config(config: NavigationConfig) -> Self {
        Self {
            grid: Grid::default(),
            config,
            revision: NavigationRevision::default(),
            pathfinder: Pathfinder::new(),
            flow_field: FlowField::new(&config),
            waypoints: Vec::new(),
            waypoints_mode: WaypointsMode::default(),
            route: Vec::new(),
            obstacles: ObstacleGrid::new(0, 0),
            next_obstacle: 0,
        }
    }

    /// Finds the shortest path-terrain route between two cells.
    ///
    /// Results are cached until the grid changes. An empty route means no
    /// path exists.
    pub fn find_path(&mut self, start: CellCoord, end: CellCoord) -> Vec<CellCoord> {
        self.pathfinder.find_path(&self.grid, start, end)
    }

    /// Validates an arbitrary candidate route against the current grid.
    pub fn validate_path(&mut self, waypoints: &[CellCoord]) -> Vec<ValidationIssue> {
        validate_points(&self.grid, &mut self.pathfinder, waypoints)
    }

    /// Validates the canonical route, or the authored waypoints when no route
    /// could be established.
    pub fn validate_route(&mut self) -> Vec<ValidationIssue> {
        let points = if self.route.is_empty() {
            &self.waypoints
        } else {
            &self.route
        };
        validate_points(&self.grid, &mut self.pathfinder, points)
    }

    /// Decides whether an obstacle may be placed on the cell.
    ///
    /// Terrain, decoration and occupancy rules are checked first. Because
    /// enemies only travel on path terrain, buildable terrain is accepted
    /// without a search unless connectivity verification is enabled.
    pub fn check_buildability(&mut self, cell: CellCoord) -> Result<(), BuildRejection> {
        placement_rules(&self.grid, &self.obstacles, cell)?;

        if !self.config.verify_connectivity {
            return Ok(());
        }

        let spawns: Vec<CellCoord> = self.waypoints.first().copied().into_iter().collect();
        if spawns.is_empty() || !self.flow_field.is_ready() {
            return Ok(());
        }

        if self
            .flow_field
            .check_buildability(&self.grid, cell, &spawns)
        {
            Ok(())
        } else {
            Err(BuildRejection::Disconnects)
        }
    }

    fn rebuild_navigation(&mut self, out_events: &mut Vec<Event>) {
        self.pathfinder.invalidate();
        self.refresh_route(out_events);

        match self.waypoints.last().copied() {
            Some(target) => self.flow_field.generate(&self.grid, target),
            None => self.flow_field.reset(self.grid.columns(), self.grid.rows()),
        }

        let version = self.grid.version();
        self.revision.mark_built(version);
        debug!(
            version,
            target = ?self.flow_field.target(),
            route_length = self.route.len(),
            "navigation rebuilt"
        );
        out_events.push(Event::NavigationRebuilt { version });
    }

    fn refresh_route(&mut self, out_events: &mut Vec<Event>) {
        match self.waypoints_mode {
            WaypointsMode::Endpoints => {
                let (Some(start), Some(end)) =
                    (self.waypoints.first().copied(), self.waypoints.last().copied())
                else {
                    self.route.clear();
                    return;
                };

                let route = self.pathfinder.find_path(&self.grid, start, end);
                if route.is_empty() {
                    warn!(?start, ?end, "no route connects the map endpoints");
                    self.route.clear();
                    out_events.push(Event::PathNotFound { start, end });
                } else {
                    out_events.push(Event::RouteDerived {
                        length: route.len(),
                    });
                    self.route = route;
                }
            }
            WaypointsMode::FullPath => {
                self.route.clone_from(&self.waypoints);
                let issues = validate_points(&self.grid, &mut self.pathfinder, &self.route);
                if !issues.is_empty() {
                    warn!(issues = issues.len(), "stored route failed validation");
                    out_events.push(Event::RouteInvalid { issues });
                }
            }
        }
    }

    fn load_map(&mut self, map: &MapData, out_events: &mut Vec<Event>) {
        let mut grid = match Grid::from_map(map) {
            Ok(grid) => grid,
            Err(reason) => {
                warn!(%reason, "rejected map data");
                out_events.push(Event::MapRejected { reason });
                return;
            }
        };
        grid.continue_versions_from(self.grid.version());

        self.grid = grid;
        self.obstacles = ObstacleGrid::new(self.grid.columns(), self.grid.rows());
        self.waypoints = map.waypoints.iter().map(|point| point.cell()).collect();
        self.waypoints_mode = map.waypoints_mode;
        self.route.clear();
        self.revision.mark_dirty();

        info!(
            columns = self.grid.columns(),
            rows = self.grid.rows(),
            waypoints = self.waypoints.len(),
            mode = ?self.waypoints_mode,
            "map loaded"
        );
        out_events.push(Event::MapLoaded {
            columns: self.grid.columns(),
            rows: self.grid.rows(),
        });

        self.rebuild_navigation(out_events);
    }
}

impl Default for MapManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the map, mutating state deterministically.
pub fn apply(world: &mut MapManager, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureNavigation { config } => {
            world.flow_field.configure(&config);
            world.config = config;
        }
        Command::LoadMap { map } => world.load_map(&map, out_events),
        Command::PaintTile { cell, terrain } => match world.grid.set_terrain(cell, terrain) {
            Ok(true) => {
                world.revision.mark_dirty();
                world.pathfinder.invalidate();
                out_events.push(Event::TilePainted { cell, terrain });

                if !terrain.is_buildable() {
                    if let Some(obstacle) = world.obstacles.vacate(cell) {
                        out_events.push(Event::ObstacleRemoved { obstacle, cell });
                    }
                }
            }
            Ok(false) => {}
            Err(reason) => out_events.push(Event::EditRejected { cell, reason }),
        },
        Command::SetWaypoints { waypoints, mode } => {
            world.waypoints = waypoints;
            world.waypoints_mode = mode;
            world.revision.mark_dirty();
            out_events.push(Event::WaypointsChanged { mode });
        }
        Command::PlaceObstacle { cell } => match world.check_buildability(cell) {
            Ok(()) => {
                let obstacle = ObstacleId::new(world.next_obstacle);
                world.next_obstacle = world.next_obstacle.saturating_add(1);
                world.obstacles.occupy(obstacle, cell);
                out_events.push(Event::ObstaclePlaced { obstacle, cell });
            }
            Err(reason) => out_events.push(Event::ObstaclePlacementRejected { cell, reason }),
        },
        Command::RemoveObstacle { obstacle } => match world.obstacles.remove(obstacle) {
            Some(cell) => out_events.push(Event::ObstacleRemoved { obstacle, cell }),
            None => out_events.push(Event::ObstacleRemovalRejected {
                obstacle,
                reason: RemovalError::MissingObstacle,
            }),
        },
        Command::Tick { dt } => {
            if world.revision.is_dirty() {
                world.rebuild_navigation(out_events);
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
    }
}

/// Query functions that provide read-only access to the map state.
pub mod query {
    use glam::Vec2;
    use rampart_core::{
        BuildRejection, CellCoord, MapData, MapDecoration, MapPoint, NavigationConfig,
        ObstacleId, TerrainKind, WaypointsMode,
    };

    use super::{placement_rules, FlowField, Grid, MapManager, NavigationRevision};

    /// Provides read-only access to the terrain grid.
    #[must_use]
    pub fn grid(world: &MapManager) -> &Grid {
        &world.grid
    }

    /// Terrain at the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn terrain(world: &MapManager, cell: CellCoord) -> Option<TerrainKind> {
        world.grid.terrain(cell)
    }

    /// Active navigation configuration.
    #[must_use]
    pub fn config(world: &MapManager) -> &NavigationConfig {
        &world.config
    }

    /// Dirty flag and built version of the navigation data.
    #[must_use]
    pub fn navigation_revision(world: &MapManager) -> NavigationRevision {
        world.revision
    }

    /// Provides read-only access to the generated flow field.
    #[must_use]
    pub fn flow_field(world: &MapManager) -> &FlowField {
        &world.flow_field
    }

    /// Steering direction for an agent at a world-space position.
    #[must_use]
    pub fn steering_vector(world: &MapManager, position: Vec2) -> Vec2 {
        world.flow_field.get_vector(position)
    }

    /// Hop distance from the cell to the target, `-1` when unreachable.
    #[must_use]
    pub fn distance(world: &MapManager, cell: CellCoord) -> i32 {
        world.flow_field.distance(cell)
    }

    /// Canonical route enemies follow, empty when none could be established.
    #[must_use]
    pub fn route(world: &MapManager) -> &[CellCoord] {
        &world.route
    }

    /// Waypoints exactly as authored.
    #[must_use]
    pub fn waypoints(world: &MapManager) -> &[CellCoord] {
        &world.waypoints
    }

    /// Interpretation applied to the authored waypoints.
    #[must_use]
    pub fn waypoints_mode(world: &MapManager) -> WaypointsMode {
        world.waypoints_mode
    }

    /// Cell enemies spawn on.
    #[must_use]
    pub fn spawn(world: &MapManager) -> Option<CellCoord> {
        world.waypoints.first().copied()
    }

    /// Cell enemies travel to.
    #[must_use]
    pub fn target(world: &MapManager) -> Option<CellCoord> {
        world.waypoints.last().copied()
    }

    /// Reports whether an obstacle may be placed on the cell.
    ///
    /// Applies terrain, decoration and occupancy rules only.
    #[must_use]
    pub fn is_buildable(world: &MapManager, cell: CellCoord) -> bool {
        placement_rules(&world.grid, &world.obstacles, cell).is_ok()
    }

    /// Reason the cell refuses construction under terrain and occupancy rules.
    #[must_use]
    pub fn placement_rejection(world: &MapManager, cell: CellCoord) -> Option<BuildRejection> {
        placement_rules(&world.grid, &world.obstacles, cell).err()
    }

    /// Obstacle occupying the provided cell, if any.
    #[must_use]
    pub fn obstacle_at(world: &MapManager, cell: CellCoord) -> Option<ObstacleId> {
        world.obstacles.occupant(cell)
    }

    /// Obstacles placed on the map in identifier order.
    #[must_use]
    pub fn obstacles(world: &MapManager) -> Vec<(ObstacleId, CellCoord)> {
        let mut placed = world.obstacles.placed();
        placed.sort_by_key(|(obstacle, _)| *obstacle);
        placed
    }

    /// Captures the map in its loader format for persistence.
    #[must_use]
    pub fn map_data(world: &MapManager) -> MapData {
        let decorations = world
            .grid
            .cells()
            .filter_map(|cell| {
                cell.decor().map(|tag| MapDecoration {
                    x: cell.coord().column(),
                    y: cell.coord().row(),
                    tag: tag.as_str().to_owned(),
                })
            })
            .collect();

        MapData {
            width: world.grid.columns(),
            height: world.grid.rows(),
            tiles: world.grid.terrain_codes(),
            waypoints: world.waypoints.iter().copied().map(MapPoint::from).collect(),
            waypoints_mode: world.waypoints_mode,
            decorations,
        }
    }
}

fn placement_rules(
    grid: &Grid,
    obstacles: &ObstacleGrid,
    cell: CellCoord,
) -> Result<(), BuildRejection> {
    let tile = grid.cell(cell).ok_or(BuildRejection::OutOfBounds)?;
    if !tile.kind().is_buildable() {
        return Err(BuildRejection::Terrain(tile.kind()));
    }
    if tile.decor().is_some() {
        return Err(BuildRejection::Decorated);
    }
    if obstacles.occupant(cell).is_some() {
        return Err(BuildRejection::Occupied);
    }
    Ok(())
}

fn validate_points(
    grid: &Grid,
    pathfinder: &mut Pathfinder,
    points: &[CellCoord],
) -> Vec<ValidationIssue> {
    let (Some(&start), Some(&end)) = (points.first(), points.last()) else {
        return vec![ValidationIssue::general(ValidationErrorKind::Unreachable)];
    };

    let mut issues = Vec::new();
    let mut seen = HashSet::with_capacity(points.len());
    let mut previous: Option<CellCoord> = None;

    for &point in points {
        if !grid.is_walkable(point) {
            issues.push(ValidationIssue::at(ValidationErrorKind::Blocked, point));
        }
        if let Some(previous) = previous {
            if !previous.is_adjacent_to(point) {
                issues.push(ValidationIssue::at(ValidationErrorKind::Disconnected, point));
            }
        }
        if !seen.insert(point) {
            issues.push(ValidationIssue::at(ValidationErrorKind::Loop, point));
        }
        previous = Some(point);
    }

    if pathfinder.find_path(grid, start, end).is_empty() {
        issues.push(ValidationIssue::at(ValidationErrorKind::Unreachable, end));
    }

    issues
}

#[derive(Clone, Debug)]
struct ObstacleGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<ObstacleId>>,
}

impl ObstacleGrid {
    fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    fn occupant(&self, cell: CellCoord) -> Option<ObstacleId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, obstacle: ObstacleId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(obstacle);
            }
        }
    }

    fn vacate(&mut self, cell: CellCoord) -> Option<ObstacleId> {
        let index = self.index(cell)?;
        self.cells.get_mut(index)?.take()
    }

    fn remove(&mut self, obstacle: ObstacleId) -> Option<CellCoord> {
        let index = self
            .cells
            .iter()
            .position(|slot| *slot == Some(obstacle))?;
        self.cells[index] = None;
        Some(self.coord_at(index))
    }

    fn placed(&self) -> Vec<(ObstacleId, CellCoord)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|obstacle| (obstacle, self.coord_at(index))))
            .collect()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn coord_at(&self, index: usize) -> CellCoord {
        let width = usize::try_from(self.columns).unwrap_or(1).max(1);
        let column = u32::try_from(index % width).unwrap_or(u32::MAX);
        let row = u32::try_from(index / width).unwrap_or(u32::MAX);
        CellCoord::new(column, row)
    }
}
