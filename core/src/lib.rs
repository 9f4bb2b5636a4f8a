#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart navigation engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative map manager, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the map manager executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems react to. Map files enter the engine as [`MapData`], which is
//! the only serialised format the engine understands.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side length of a square tile in world units when no configuration is supplied.
pub const DEFAULT_TILE_SIZE: f32 = 32.0;

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Reports whether `other` shares an edge with this cell.
    #[must_use]
    pub fn is_adjacent_to(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Cell reached by taking one step in `direction`, rejecting steps that
    /// leave a `columns` x `rows` grid instead of wrapping.
    #[must_use]
    pub fn step(self, direction: Direction, columns: u32, rows: u32) -> Option<CellCoord> {
        let (column, row) = match direction {
            Direction::North => (self.column, self.row.checked_sub(1)?),
            Direction::East => (self.column.checked_add(1)?, self.row),
            Direction::South => (self.column, self.row.checked_add(1)?),
            Direction::West => (self.column.checked_sub(1)?, self.row),
        };

        if column < columns && row < rows {
            Some(CellCoord::new(column, row))
        } else {
            None
        }
    }
}

/// Cardinal movement directions available to navigating agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Fixed neighbor order used by every search: up, right, down, left.
    pub const SEARCH_ORDER: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit column and row offsets of the direction.
    #[must_use]
    pub const fn offset(self) -> (i8, i8) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Terrain assigned to a grid cell.
///
/// Only [`TerrainKind::Path`] is traversable by enemies. Grass and sand accept
/// construction, every other kind rejects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Plain buildable ground.
    Grass,
    /// Dedicated enemy path.
    Path,
    /// Open water.
    Water,
    /// Buildable sand.
    Sand,
    /// Bridge spanning water.
    Bridge,
    /// Molten lava.
    Lava,
}

impl TerrainKind {
    /// Decodes a map-file terrain code, treating unknown codes as grass.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Path,
            2 => Self::Water,
            3 => Self::Sand,
            4 => Self::Bridge,
            5 => Self::Lava,
            _ => Self::Grass,
        }
    }

    /// Map-file terrain code of the kind.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Grass => 0,
            Self::Path => 1,
            Self::Water => 2,
            Self::Sand => 3,
            Self::Bridge => 4,
            Self::Lava => 5,
        }
    }

    /// Reports whether enemies may traverse the terrain.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Path)
    }

    /// Reports whether obstacles may be constructed on the terrain.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Grass | Self::Sand)
    }
}

/// Decoration placed on top of a cell, such as a rock or tree.
///
/// Decorated cells block construction but never affect navigation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecorTag(String);

impl DecorTag {
    /// Creates a new decoration tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Name of the decoration.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier assigned to an obstacle placed by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// How the waypoints stored in a map should be interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaypointsMode {
    /// Only the start and end are stored; the route is derived by search.
    #[default]
    #[serde(rename = "ENDPOINTS")]
    Endpoints,
    /// The complete route is stored and only validated.
    #[serde(rename = "FULLPATH")]
    FullPath,
}

/// Waypoint as written in map files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapPoint {
    /// Column of the waypoint.
    pub x: u32,
    /// Row of the waypoint.
    pub y: u32,
}

impl MapPoint {
    /// Converts the waypoint into a cell coordinate.
    #[must_use]
    pub const fn cell(self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }
}

impl From<CellCoord> for MapPoint {
    fn from(cell: CellCoord) -> Self {
        Self {
            x: cell.column(),
            y: cell.row(),
        }
    }
}

/// Decoration entry written in map files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDecoration {
    /// Column of the decorated cell.
    pub x: u32,
    /// Row of the decorated cell.
    pub y: u32,
    /// Name of the decoration.
    pub tag: String,
}

/// Map description supplied by the loader.
///
/// `tiles` is indexed as `tiles[row][column]` and holds terrain codes as
/// understood by [`TerrainKind::from_code`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    /// Number of columns in the grid.
    pub width: u32,
    /// Number of rows in the grid.
    pub height: u32,
    /// Terrain codes laid out row by row.
    pub tiles: Vec<Vec<i32>>,
    /// Ordered waypoints interpreted according to `waypoints_mode`.
    #[serde(default)]
    pub waypoints: Vec<MapPoint>,
    /// Interpretation applied to `waypoints`.
    #[serde(default)]
    pub waypoints_mode: WaypointsMode,
    /// Optional decorations placed on top of the terrain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorations: Vec<MapDecoration>,
}

impl MapData {
    /// Checks that the tile array agrees with the declared dimensions.
    pub fn validate(&self) -> Result<(), MapDataError> {
        if self.width == 0 || self.height == 0 {
            return Err(MapDataError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let expected_rows = usize::try_from(self.height).unwrap_or(usize::MAX);
        if self.tiles.len() != expected_rows {
            return Err(MapDataError::RowCountMismatch {
                expected: self.height,
                found: self.tiles.len(),
            });
        }

        let expected_columns = usize::try_from(self.width).unwrap_or(usize::MAX);
        for (row, tiles) in self.tiles.iter().enumerate() {
            if tiles.len() != expected_columns {
                return Err(MapDataError::ColumnCountMismatch {
                    row,
                    expected: self.width,
                    found: tiles.len(),
                });
            }
        }

        for decoration in &self.decorations {
            if decoration.x >= self.width || decoration.y >= self.height {
                return Err(MapDataError::DecorationOutOfBounds {
                    x: decoration.x,
                    y: decoration.y,
                });
            }
        }

        Ok(())
    }
}

/// Reasons map data may be rejected by the loader.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MapDataError {
    /// The map declared a zero-sized grid.
    #[error("map dimensions {width}x{height} must both be non-zero")]
    ZeroDimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
    /// The tile array holds a different number of rows than declared.
    #[error("expected {expected} tile rows, found {found}")]
    RowCountMismatch {
        /// Declared height.
        expected: u32,
        /// Number of rows present.
        found: usize,
    },
    /// A tile row holds a different number of columns than declared.
    #[error("tile row {row} holds {found} columns, expected {expected}")]
    ColumnCountMismatch {
        /// Offending row index.
        row: usize,
        /// Declared width.
        expected: u32,
        /// Number of columns present.
        found: usize,
    },
    /// A decoration lies outside of the grid.
    #[error("decoration at ({x}, {y}) lies outside of the grid")]
    DecorationOutOfBounds {
        /// Column of the decoration.
        x: u32,
        /// Row of the decoration.
        y: u32,
    },
}

/// Category of a route validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// A waypoint lies outside of the grid or off path terrain.
    Blocked,
    /// Two consecutive waypoints are not edge-adjacent.
    Disconnected,
    /// The route end cannot be reached from its start.
    Unreachable,
    /// A waypoint repeats an earlier coordinate.
    Loop,
}

/// Single route validation failure, tagged with the offending cell if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Category of the failure.
    pub kind: ValidationErrorKind,
    /// Cell the editor should highlight, absent for routes without endpoints.
    pub cell: Option<CellCoord>,
}

impl ValidationIssue {
    /// Creates an issue attached to a cell.
    #[must_use]
    pub const fn at(kind: ValidationErrorKind, cell: CellCoord) -> Self {
        Self {
            kind,
            cell: Some(cell),
        }
    }

    /// Creates an issue that does not refer to a particular cell.
    #[must_use]
    pub const fn general(kind: ValidationErrorKind) -> Self {
        Self { kind, cell: None }
    }
}

/// Reasons a cell may refuse construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildRejection {
    /// The cell lies outside of the grid.
    OutOfBounds,
    /// The terrain does not accept construction.
    Terrain(TerrainKind),
    /// A decoration already occupies the cell.
    Decorated,
    /// An obstacle already occupies the cell.
    Occupied,
    /// Blocking the cell would cut every spawn off from the target.
    Disconnects,
}

/// Reasons a tile edit may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditError {
    /// The edited cell lies outside of the grid.
    OutOfBounds,
}

/// Reasons an obstacle removal request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No obstacle with the provided identifier exists.
    MissingObstacle,
}

/// Tunable parameters of the navigation engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationConfig {
    /// Side length of a tile in world units.
    pub tile_size: f32,
    /// Offset from the tile centerline, as a fraction of the tile size, that
    /// triggers centering correction.
    pub centering_threshold: f32,
    /// Strength of the centering correction per tile of offset.
    pub centering_gain: f32,
    /// Allowed deviation of the steering magnitude from 1 before it is
    /// re-normalised.
    pub normalization_tolerance: f32,
    /// Runs the flow-field connectivity check before accepting construction.
    pub verify_connectivity: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            centering_threshold: 0.1,
            centering_gain: 0.5,
            normalization_tolerance: 0.01,
            verify_connectivity: false,
        }
    }
}

/// Commands that express all permissible map mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the navigation tuning parameters.
    ConfigureNavigation {
        /// New configuration to apply.
        config: NavigationConfig,
    },
    /// Replaces the grid and waypoints with the provided map.
    LoadMap {
        /// Map description produced by the loader.
        map: MapData,
    },
    /// Changes the terrain of a single cell.
    PaintTile {
        /// Cell being edited.
        cell: CellCoord,
        /// Terrain to assign.
        terrain: TerrainKind,
    },
    /// Replaces the authored waypoints.
    SetWaypoints {
        /// Ordered waypoints.
        waypoints: Vec<CellCoord>,
        /// Interpretation applied to the waypoints.
        mode: WaypointsMode,
    },
    /// Requests placement of an obstacle on the provided cell.
    PlaceObstacle {
        /// Cell that should hold the obstacle.
        cell: CellCoord,
    },
    /// Requests removal of an existing obstacle.
    RemoveObstacle {
        /// Identifier of the obstacle targeted for removal.
        obstacle: ObstacleId,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the map manager after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a new map replaced the grid.
    MapLoaded {
        /// Number of columns in the loaded grid.
        columns: u32,
        /// Number of rows in the loaded grid.
        rows: u32,
    },
    /// Reports that map data was malformed and left the previous grid intact.
    MapRejected {
        /// Specific reason the map failed to load.
        reason: MapDataError,
    },
    /// Confirms that a tile changed terrain.
    TilePainted {
        /// Edited cell.
        cell: CellCoord,
        /// Terrain now assigned to the cell.
        terrain: TerrainKind,
    },
    /// Reports that a tile edit was rejected.
    EditRejected {
        /// Cell provided in the edit request.
        cell: CellCoord,
        /// Specific reason the edit failed.
        reason: EditError,
    },
    /// Confirms that the authored waypoints changed.
    WaypointsChanged {
        /// Interpretation applied to the new waypoints.
        mode: WaypointsMode,
    },
    /// Confirms that a canonical route was derived from the endpoints.
    RouteDerived {
        /// Number of cells in the derived route.
        length: usize,
    },
    /// Reports that no route connects the authored endpoints.
    PathNotFound {
        /// First authored waypoint.
        start: CellCoord,
        /// Last authored waypoint.
        end: CellCoord,
    },
    /// Reports that the authoritative route failed validation.
    RouteInvalid {
        /// Every validation failure detected.
        issues: Vec<ValidationIssue>,
    },
    /// Confirms that the flow field was regenerated.
    NavigationRebuilt {
        /// Grid version the navigation data now reflects.
        version: u64,
    },
    /// Confirms that an obstacle was placed.
    ObstaclePlaced {
        /// Identifier assigned to the obstacle.
        obstacle: ObstacleId,
        /// Cell occupied by the obstacle.
        cell: CellCoord,
    },
    /// Reports that an obstacle placement request was rejected.
    ObstaclePlacementRejected {
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: BuildRejection,
    },
    /// Confirms that an obstacle was removed.
    ObstacleRemoved {
        /// Identifier of the removed obstacle.
        obstacle: ObstacleId,
        /// Cell previously occupied by the obstacle.
        cell: CellCoord,
    },
    /// Reports that an obstacle removal request was rejected.
    ObstacleRemovalRejected {
        /// Identifier provided in the removal request.
        obstacle: ObstacleId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
}
