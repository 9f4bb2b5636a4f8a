use std::time::Duration;

use rampart_core::{
    CellCoord, Command, Event, MapData, MapPoint, ObstacleId, TerrainKind, WaypointsMode,
};
use rampart_system_builder::{Builder, BuilderInput, BuilderTool, PlacementPreview};
use rampart_world::{apply, query, MapManager};

fn confirm_at(cell: CellCoord) -> BuilderInput {
    BuilderInput::new(true, false, Some(cell))
}

#[test]
fn confirm_emits_place_command_for_placeable_preview() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        Some(PlacementPreview::new(CellCoord::new(2, 2), true)),
        BuilderInput {
            confirm_action: true,
            ..BuilderInput::default()
        },
        |_| None,
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::PlaceObstacle {
            cell: CellCoord::new(2, 2),
        }],
        "builder should emit a placement command when confirming a valid preview",
    );
}

#[test]
fn confirm_ignored_when_preview_not_placeable() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        Some(PlacementPreview::new(CellCoord::new(2, 2), false)),
        confirm_at(CellCoord::new(2, 2)),
        |_| None,
        &mut commands,
    );

    assert!(
        commands.is_empty(),
        "invalid preview must not emit commands"
    );
}

#[test]
fn remove_emits_command_when_obstacle_present() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();
    let hovered_cell = CellCoord::new(2, 2);
    let returned_obstacle = ObstacleId::new(7);
    let mut looked_up = None;

    builder.handle(
        &[],
        None,
        BuilderInput {
            remove_action: true,
            cursor_cell: Some(hovered_cell),
            ..BuilderInput::default()
        },
        |cell| {
            looked_up = Some(cell);
            Some(returned_obstacle)
        },
        &mut commands,
    );

    assert_eq!(looked_up, Some(hovered_cell));
    assert_eq!(
        commands,
        vec![Command::RemoveObstacle {
            obstacle: returned_obstacle,
        }],
        "remove action should target the obstacle under the cursor",
    );
}

#[test]
fn remove_ignored_when_no_obstacle_present() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        None,
        BuilderInput::new(false, true, Some(CellCoord::new(1, 1))),
        |_| None,
        &mut commands,
    );

    assert!(
        commands.is_empty(),
        "no obstacle under cursor, nothing to remove"
    );
}

#[test]
fn paint_stroke_emits_each_cell_once_in_order() {
    let mut builder = Builder::new();
    builder.select_tool(BuilderTool::Paint(TerrainKind::Path));
    let mut commands = Vec::new();
    let stroke = [
        CellCoord::new(0, 0),
        CellCoord::new(1, 0),
        CellCoord::new(1, 0),
        CellCoord::new(0, 0),
        CellCoord::new(1, 1),
    ];

    for cell in stroke {
        builder.handle(&[], None, confirm_at(cell), |_| None, &mut commands);
    }

    let painted: Vec<_> = commands
        .iter()
        .map(|command| match command {
            Command::PaintTile { cell, terrain } => {
                assert_eq!(*terrain, TerrainKind::Path);
                *cell
            }
            other => panic!("unexpected command {other:?}"),
        })
        .collect();
    assert_eq!(
        painted,
        vec![
            CellCoord::new(0, 0),
            CellCoord::new(1, 0),
            CellCoord::new(1, 1)
        ],
        "brush must skip cells already painted in the same stroke",
    );
}

#[test]
fn releasing_the_brush_starts_a_new_stroke() {
    let mut builder = Builder::new();
    builder.select_tool(BuilderTool::Paint(TerrainKind::Water));
    let mut commands = Vec::new();
    let cell = CellCoord::new(3, 3);

    builder.handle(&[], None, confirm_at(cell), |_| None, &mut commands);
    builder.handle(
        &[],
        None,
        BuilderInput::new(false, false, Some(cell)),
        |_| None,
        &mut commands,
    );
    builder.handle(&[], None, confirm_at(cell), |_| None, &mut commands);

    assert_eq!(commands.len(), 2);
}

#[test]
fn route_tool_pairs_start_and_end_clicks() {
    let mut builder = Builder::new();
    builder.select_tool(BuilderTool::Route);
    let mut commands = Vec::new();
    let start = CellCoord::new(0, 1);
    let end = CellCoord::new(4, 1);

    builder.handle(&[], None, confirm_at(start), |_| None, &mut commands);
    assert!(commands.is_empty());
    assert_eq!(builder.pending_route_start(), Some(start));

    builder.handle(&[], None, confirm_at(end), |_| None, &mut commands);

    assert_eq!(
        commands,
        vec![Command::SetWaypoints {
            waypoints: vec![start, end],
            mode: WaypointsMode::Endpoints,
        }]
    );
    assert_eq!(builder.pending_route_start(), None);
}

#[test]
fn map_load_discards_pending_route_start() {
    let mut builder = Builder::new();
    builder.select_tool(BuilderTool::Route);
    let mut commands = Vec::new();

    builder.handle(
        &[],
        None,
        confirm_at(CellCoord::new(0, 1)),
        |_| None,
        &mut commands,
    );
    builder.handle(
        &[Event::MapLoaded {
            columns: 5,
            rows: 5,
        }],
        None,
        BuilderInput::default(),
        |_| None,
        &mut commands,
    );

    assert_eq!(builder.pending_route_start(), None);
    assert!(commands.is_empty());
}

#[test]
fn switching_tools_abandons_route_in_progress() {
    let mut builder = Builder::new();
    builder.select_tool(BuilderTool::Route);
    let mut commands = Vec::new();
    builder.handle(
        &[],
        None,
        confirm_at(CellCoord::new(0, 1)),
        |_| None,
        &mut commands,
    );

    builder.select_tool(BuilderTool::Build);
    builder.select_tool(BuilderTool::Route);

    assert_eq!(builder.tool(), BuilderTool::Route);
    assert_eq!(builder.pending_route_start(), None);
}

#[test]
fn painted_shortcut_reroutes_the_map_after_a_tick() {
    let mut world = MapManager::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::LoadMap {
            map: MapData {
                width: 3,
                height: 3,
                tiles: vec![vec![1, 1, 1], vec![1, 0, 1], vec![1, 0, 1]],
                waypoints: vec![MapPoint { x: 0, y: 2 }, MapPoint { x: 2, y: 2 }],
                waypoints_mode: WaypointsMode::Endpoints,
                decorations: Vec::new(),
            },
        },
        &mut events,
    );
    assert_eq!(query::route(&world).len(), 7);

    let mut builder = Builder::new();
    builder.select_tool(BuilderTool::Paint(TerrainKind::Path));
    let mut commands = Vec::new();
    builder.handle(
        &events,
        None,
        confirm_at(CellCoord::new(1, 2)),
        |cell| query::obstacle_at(&world, cell),
        &mut commands,
    );
    events.clear();
    for command in commands {
        apply(&mut world, command, &mut events);
    }
    apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(16),
        },
        &mut events,
    );

    assert_eq!(query::route(&world).len(), 3);
    assert_eq!(query::distance(&world, CellCoord::new(0, 2)), 2);
}
