use glam::Vec2;
use rampart_core::{CellCoord, Direction, TerrainKind};
use rampart_world::{FlowField, Grid, Pathfinder, UNREACHABLE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TILE: f32 = 32.0;

#[test]
fn find_path_is_deterministic_and_shortest() {
    for seed in 0..24 {
        let grid = random_grid(seed, 9, 7);
        let Some((start, end)) = endpoints(&grid) else {
            continue;
        };
        let oracle = oracle_distances(&grid, end);

        let first = Pathfinder::new().find_path(&grid, start, end);
        let second = Pathfinder::new().find_path(&grid, start, end);

        assert_eq!(first, second, "seed {seed}: search must be deterministic");

        let expected = oracle[flat(&grid, start)];
        if expected == UNREACHABLE {
            assert!(first.is_empty(), "seed {seed}: unreachable end produced a path");
            continue;
        }

        assert_eq!(
            first.len(),
            usize::try_from(expected).expect("distance is positive") + 1,
            "seed {seed}: path length must match the BFS hop count",
        );
        assert_eq!(first.first(), Some(&start));
        assert_eq!(first.last(), Some(&end));
        assert!(first.windows(2).all(|pair| pair[0].is_adjacent_to(pair[1])));
        assert!(first.iter().all(|cell| grid.is_walkable(*cell)));
    }
}

#[test]
fn distance_field_matches_recurrence() {
    for seed in 0..24 {
        let grid = random_grid(seed, 10, 8);
        let Some((_, target)) = endpoints(&grid) else {
            continue;
        };
        let mut field = FlowField::default();

        field.generate(&grid, target);

        assert_eq!(field.distance(target), 0);
        let oracle = oracle_distances(&grid, target);
        assert_eq!(field.distances(), oracle.as_slice(), "seed {seed}");

        for cell in grid.cells().map(|cell| cell.coord()) {
            let distance = field.distance(cell);
            if distance <= 0 {
                continue;
            }
            let lowest = neighbors(&grid, cell)
                .map(|neighbor| field.distance(neighbor))
                .filter(|distance| *distance != UNREACHABLE)
                .min()
                .expect("reachable cell has a reachable neighbor");
            assert_eq!(distance, lowest + 1, "seed {seed}: cell {cell:?}");
        }
    }
}

#[test]
fn nonzero_vectors_point_downhill() {
    for seed in 0..24 {
        let grid = random_grid(seed, 10, 8);
        let Some((_, target)) = endpoints(&grid) else {
            continue;
        };
        let mut field = FlowField::default();
        field.generate(&grid, target);

        for cell in grid.cells().map(|cell| cell.coord()) {
            let step = field.vector(cell);
            let Some(direction) = step.direction() else {
                assert!(step.is_zero());
                assert!(field.distance(cell) <= 0, "seed {seed}: {cell:?} lacks a step");
                continue;
            };

            let next = cell
                .step(direction, grid.columns(), grid.rows())
                .expect("step stays inside the grid");
            assert!(
                field.distance(next) >= 0 && field.distance(next) < field.distance(cell),
                "seed {seed}: {cell:?} steps uphill",
            );
        }
    }
}

#[test]
fn repeated_queries_hit_the_cache_until_the_grid_changes() {
    let mut grid = grid_from_rows(&["#####", "#...#", "#####"]);
    let mut pathfinder = Pathfinder::new();
    let start = CellCoord::new(0, 0);
    let end = CellCoord::new(4, 2);

    let first = pathfinder.find_path(&grid, start, end);
    let second = pathfinder.find_path(&grid, start, end);

    assert_eq!(first, second);
    assert_eq!(pathfinder.searches(), 1, "second query must be served from cache");

    let _ = grid
        .set_terrain(CellCoord::new(2, 1), TerrainKind::Path)
        .expect("cell inside grid");
    let third = pathfinder.find_path(&grid, start, end);

    assert_eq!(pathfinder.searches(), 2, "grid mutation must force a new search");
    assert_eq!(third.len(), first.len());
}

#[test]
fn different_endpoints_replace_the_single_cache_entry() {
    let grid = grid_from_rows(&["#####"]);
    let mut pathfinder = Pathfinder::new();
    let a = CellCoord::new(0, 0);
    let b = CellCoord::new(4, 0);

    let _ = pathfinder.find_path(&grid, a, b);
    let _ = pathfinder.find_path(&grid, b, a);
    let _ = pathfinder.find_path(&grid, a, b);

    assert_eq!(pathfinder.searches(), 3);
}

#[test]
fn generate_is_idempotent() {
    let grid = random_grid(7, 12, 9);
    let (_, target) = endpoints(&grid).expect("seeded grid holds path cells");
    let mut field = FlowField::default();

    field.generate(&grid, target);
    let distances = field.distances().to_vec();
    let vectors = field.vectors().to_vec();
    field.generate(&grid, target);

    assert_eq!(field.distances(), distances.as_slice());
    assert_eq!(field.vectors(), vectors.as_slice());
}

#[test]
fn simple_corridor_follows_the_path_row() {
    let grid = grid_from_rows(&[".....", "~~~~~", "#####", "~~~~~", "....."]);
    let start = CellCoord::new(0, 2);
    let end = CellCoord::new(4, 2);

    let path = Pathfinder::new().find_path(&grid, start, end);
    let mut field = FlowField::default();
    field.generate(&grid, end);

    let expected: Vec<_> = (0..5).map(|column| CellCoord::new(column, 2)).collect();
    assert_eq!(path, expected);
    assert_eq!(field.distance(start), 4);
    assert_eq!(
        field.vector(start).direction(),
        Some(Direction::East),
        "corridor cells steer toward the far end",
    );
}

#[test]
fn disconnected_island_stays_unreachable() {
    let grid = grid_from_rows(&["###..", "....#", "...##"]);
    let target = CellCoord::new(0, 0);
    let island = [
        CellCoord::new(4, 1),
        CellCoord::new(3, 2),
        CellCoord::new(4, 2),
    ];
    let mut field = FlowField::default();

    field.generate(&grid, target);

    for cell in island {
        assert_eq!(field.distance(cell), UNREACHABLE, "{cell:?} must be unreachable");
        assert!(field.vector(cell).is_zero());
    }
    assert!(Pathfinder::new()
        .find_path(&grid, target, CellCoord::new(4, 2))
        .is_empty());
}

#[test]
fn surrounding_terrain_variety_does_not_change_distances() {
    let plain = grid_from_rows(&["......", ".####.", ".#..#.", ".#..##", "......"]);
    let varied = grid_from_rows(&["s~L.B~", "~####s", "L#~B#.", "B#sL##", "~.sLB~"]);
    let target = CellCoord::new(5, 3);
    let mut plain_field = FlowField::default();
    let mut varied_field = FlowField::default();

    plain_field.generate(&plain, target);
    varied_field.generate(&varied, target);

    assert_eq!(plain_field.distances(), varied_field.distances());
    assert_eq!(plain_field.vectors(), varied_field.vectors());
    for cell in varied.cells().filter(|cell| !cell.kind().is_walkable()) {
        if cell.coord() != target {
            assert_eq!(varied_field.distance(cell.coord()), UNREACHABLE);
        }
    }
}

#[test]
fn steering_walks_an_agent_around_a_corner_to_the_target() {
    let grid = grid_from_rows(&["####", "...#", "...#", "...#"]);
    let target = CellCoord::new(3, 3);
    let mut field = FlowField::default();
    field.generate(&grid, target);

    let mut position = Vec2::new(TILE * 0.5, TILE * 0.5);
    let mut steps = 0;
    while cell_under(position) != target {
        let steer = field.get_vector(position);
        assert_ne!(steer, Vec2::ZERO, "agent stalled at {position:?}");
        assert!((steer.length() - 1.0).abs() <= 0.011);

        position += steer * 4.0;
        steps += 1;

        assert!(
            grid.is_walkable(cell_under(position)),
            "agent left the path at {position:?}",
        );
        assert!(steps < 200, "agent never reached the target");
    }

    assert_eq!(field.get_vector(position), Vec2::ZERO);
}

fn cell_under(position: Vec2) -> CellCoord {
    CellCoord::new((position.x / TILE) as u32, (position.y / TILE) as u32)
}

fn grid_from_rows(rows: &[&str]) -> Grid {
    let columns = u32::try_from(rows[0].len()).expect("row fits u32");
    let height = u32::try_from(rows.len()).expect("height fits u32");
    let mut grid = Grid::new(columns, height, TerrainKind::Grass);
    for (row, line) in rows.iter().enumerate() {
        for (column, symbol) in line.chars().enumerate() {
            let terrain = match symbol {
                '#' => TerrainKind::Path,
                '~' => TerrainKind::Water,
                's' => TerrainKind::Sand,
                'L' => TerrainKind::Lava,
                'B' => TerrainKind::Bridge,
                _ => TerrainKind::Grass,
            };
            let cell = CellCoord::new(column as u32, row as u32);
            let _ = grid.set_terrain(cell, terrain).expect("cell inside grid");
        }
    }
    grid
}

fn random_grid(seed: u64, columns: u32, rows: u32) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = Grid::new(columns, rows, TerrainKind::Grass);
    for row in 0..rows {
        for column in 0..columns {
            if rng.gen_bool(0.62) {
                let _ = grid
                    .set_terrain(CellCoord::new(column, row), TerrainKind::Path)
                    .expect("cell inside grid");
            }
        }
    }
    grid
}

fn endpoints(grid: &Grid) -> Option<(CellCoord, CellCoord)> {
    let mut walkable = grid
        .cells()
        .filter(|cell| cell.kind().is_walkable())
        .map(|cell| cell.coord());
    let first = walkable.next()?;
    let last = walkable.last().unwrap_or(first);
    Some((first, last))
}

fn neighbors(grid: &Grid, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
    Direction::SEARCH_ORDER
        .into_iter()
        .filter_map(move |direction| cell.step(direction, grid.columns(), grid.rows()))
}

fn flat(grid: &Grid, cell: CellCoord) -> usize {
    grid.index(cell).expect("cell inside grid")
}

/// Relaxes hop counts until they settle; independent of the queue-based BFS.
fn oracle_distances(grid: &Grid, target: CellCoord) -> Vec<i32> {
    let mut distances = vec![UNREACHABLE; grid.cell_count()];
    distances[flat(grid, target)] = 0;

    loop {
        let mut changed = false;
        for cell in grid.cells() {
            let coord = cell.coord();
            if coord == target || !cell.kind().is_walkable() {
                continue;
            }
            let best = neighbors(grid, coord)
                .map(|neighbor| distances[flat(grid, neighbor)])
                .filter(|distance| *distance != UNREACHABLE)
                .min();
            if let Some(best) = best {
                let index = flat(grid, coord);
                if distances[index] == UNREACHABLE || distances[index] > best + 1 {
                    distances[index] = best + 1;
                    changed = true;
                }
            }
        }
        if !changed {
            return distances;
        }
    }
}
