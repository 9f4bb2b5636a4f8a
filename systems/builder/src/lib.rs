#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure editor system that turns cursor input into map commands.
//!
//! The builder never touches the map directly. Adapters feed it the events of
//! the previous frame, a placement preview and the frame's input, and it
//! answers with a batch of [`Command`]s for the map manager.

use rampart_core::{CellCoord, Command, Event, ObstacleId, TerrainKind, WaypointsMode};

/// Editing tool currently selected by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuilderTool {
    /// Places and removes obstacles.
    Build,
    /// Paints terrain under the cursor while the confirm action is held.
    Paint(TerrainKind),
    /// Picks the start and end of an endpoint route.
    Route,
}

/// Declarative placement preview describing a potential obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Cell the obstacle would occupy.
    pub origin: CellCoord,
    /// Indicates whether the preview represents a valid placement location.
    pub placeable: bool,
}

impl PlacementPreview {
    /// Creates a new placement preview descriptor.
    #[must_use]
    pub const fn new(origin: CellCoord, placeable: bool) -> Self {
        Self { origin, placeable }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the confirm action is active on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player requested removal on this frame.
    pub remove_action: bool,
    /// Cell currently hovered by the cursor.
    pub cursor_cell: Option<CellCoord>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        confirm_action: bool,
        remove_action: bool,
        cursor_cell: Option<CellCoord>,
    ) -> Self {
        Self {
            confirm_action,
            remove_action,
            cursor_cell,
        }
    }
}

/// Editor system that translates preview + input into map commands.
#[derive(Debug, Clone)]
pub struct Builder {
    tool: BuilderTool,
    stroke: Vec<CellCoord>,
    route_start: Option<CellCoord>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a builder with the build tool selected.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tool: BuilderTool::Build,
            stroke: Vec::new(),
            route_start: None,
        }
    }

    /// Switches tools, abandoning any stroke or route in progress.
    pub fn select_tool(&mut self, tool: BuilderTool) {
        if self.tool != tool {
            self.tool = tool;
            self.stroke.clear();
            self.route_start = None;
        }
    }

    /// Tool currently selected.
    #[must_use]
    pub const fn tool(&self) -> BuilderTool {
        self.tool
    }

    /// Start point recorded by the route tool and still awaiting an end.
    #[must_use]
    pub const fn pending_route_start(&self) -> Option<CellCoord> {
        self.route_start
    }

    /// Consumes map events and adapter-derived input to emit editor commands.
    ///
    /// The `obstacle_at` closure should mirror the semantics of the world's
    /// `query::obstacle_at` helper so the system can identify the hovered
    /// obstacle.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        preview: Option<PlacementPreview>,
        input: BuilderInput,
        obstacle_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(CellCoord) -> Option<ObstacleId>,
    {
        for event in events {
            if let Event::MapLoaded { .. } = event {
                self.stroke.clear();
                self.route_start = None;
            }
        }

        match self.tool {
            BuilderTool::Build => Self::build(preview, input, obstacle_at, out),
            BuilderTool::Paint(terrain) => self.paint(terrain, input, out),
            BuilderTool::Route => self.route(input, out),
        }
    }

    fn build<F>(
        preview: Option<PlacementPreview>,
        input: BuilderInput,
        mut obstacle_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(CellCoord) -> Option<ObstacleId>,
    {
        if input.confirm_action {
            if let Some(preview) = preview {
                if preview.placeable {
                    out.push(Command::PlaceObstacle {
                        cell: preview.origin,
                    });
                }
            }
        }

        if input.remove_action {
            if let Some(cell) = input.cursor_cell {
                if let Some(obstacle) = obstacle_at(cell) {
                    out.push(Command::RemoveObstacle { obstacle });
                }
            }
        }
    }

    fn paint(&mut self, terrain: TerrainKind, input: BuilderInput, out: &mut Vec<Command>) {
        if !input.confirm_action {
            self.stroke.clear();
            return;
        }

        let Some(cell) = input.cursor_cell else {
            return;
        };
        if self.stroke.contains(&cell) {
            return;
        }

        self.stroke.push(cell);
        out.push(Command::PaintTile { cell, terrain });
    }

    fn route(&mut self, input: BuilderInput, out: &mut Vec<Command>) {
        if input.remove_action {
            self.route_start = None;
            return;
        }
        if !input.confirm_action {
            return;
        }
        let Some(cell) = input.cursor_cell else {
            return;
        };

        match self.route_start.take() {
            None => self.route_start = Some(cell),
            Some(start) => out.push(Command::SetWaypoints {
                waypoints: vec![start, cell],
                mode: WaypointsMode::Endpoints,
            }),
        }
    }
}
