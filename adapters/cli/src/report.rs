//! Plain-text renderings of a loaded map for terminal inspection.

use std::fmt::Write as _;

use rampart_core::{CellCoord, Direction, TerrainKind, ValidationIssue};
use rampart_world::{query, MapManager, UNREACHABLE};

/// Glyph drawn for cells that enemies never enter.
fn terrain_glyph(kind: TerrainKind) -> char {
    match kind {
        TerrainKind::Grass => '.',
        TerrainKind::Path => '?',
        TerrainKind::Water => '~',
        TerrainKind::Sand => ':',
        TerrainKind::Bridge => '=',
        TerrainKind::Lava => '!',
    }
}

fn arrow(direction: Direction) -> char {
    match direction {
        Direction::North => '^',
        Direction::East => '>',
        Direction::South => 'v',
        Direction::West => '<',
    }
}

/// Renders hop distances to the target, one right-aligned column per cell.
///
/// Unreached cells show their terrain glyph instead.
pub(crate) fn distance_field(world: &MapManager) -> String {
    render(world, 3, |world, cell, kind| {
        let distance = query::distance(world, cell);
        if distance == UNREACHABLE {
            terrain_glyph(kind).to_string()
        } else {
            distance.to_string()
        }
    })
}

/// Renders the step direction of every cell, `T` marking the target.
pub(crate) fn flow_arrows(world: &MapManager) -> String {
    let target = query::flow_field(world).target();
    render(world, 1, |world, cell, kind| {
        if Some(cell) == target {
            return "T".to_owned();
        }
        match query::flow_field(world).vector(cell).direction() {
            Some(direction) => arrow(direction).to_string(),
            None => terrain_glyph(kind).to_string(),
        }
    })
}

/// One line per validation issue, or a single confirmation line.
pub(crate) fn issues(issues: &[ValidationIssue]) -> String {
    if issues.is_empty() {
        return "route is valid\n".to_owned();
    }

    let mut out = String::new();
    for issue in issues {
        let _ = match issue.cell {
            Some(cell) => writeln!(out, "{:?} at ({}, {})", issue.kind, cell.column(), cell.row()),
            None => writeln!(out, "{:?}", issue.kind),
        };
    }
    out
}

fn render<F>(world: &MapManager, width: usize, mut token: F) -> String
where
    F: FnMut(&MapManager, CellCoord, TerrainKind) -> String,
{
    let grid = query::grid(world);
    let mut out = String::new();
    for row in 0..grid.rows() {
        for column in 0..grid.columns() {
            let cell = CellCoord::new(column, row);
            let kind = grid.terrain(cell).unwrap_or(TerrainKind::Grass);
            let _ = write!(out, "{:>width$}", token(world, cell, kind));
        }
        out.push('\n');
    }
    out
}
