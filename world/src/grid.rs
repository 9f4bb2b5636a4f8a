//! Dense terrain grid that is the sole source of walkability.

use rampart_core::{CellCoord, DecorTag, EditError, MapData, MapDataError, TerrainKind};

/// Single grid tile with its terrain and optional decoration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    coord: CellCoord,
    kind: TerrainKind,
    decor: Option<DecorTag>,
}

impl Cell {
    /// Coordinate identifying the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Terrain currently assigned to the cell.
    #[must_use]
    pub const fn kind(&self) -> TerrainKind {
        self.kind
    }

    /// Decoration placed on the cell, if any.
    #[must_use]
    pub fn decor(&self) -> Option<&DecorTag> {
        self.decor.as_ref()
    }
}

/// Row-major grid of cells tagged with a monotonically increasing version.
///
/// Every mutation that changes a cell bumps the version so caches keyed on it
/// can detect stale results.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
    version: u64,
}

impl Grid {
    /// Creates a grid filled with a single terrain kind.
    #[must_use]
    pub fn new(columns: u32, rows: u32, fill: TerrainKind) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut cells = Vec::with_capacity(capacity);
        for row in 0..rows {
            for column in 0..columns {
                cells.push(Cell {
                    coord: CellCoord::new(column, row),
                    kind: fill,
                    decor: None,
                });
            }
        }

        Self {
            columns,
            rows,
            cells,
            version: 0,
        }
    }

    /// Builds a grid from loader-provided map data.
    pub fn from_map(map: &MapData) -> Result<Self, MapDataError> {
        map.validate()?;

        let mut grid = Self::new(map.width, map.height, TerrainKind::Grass);
        for (row, codes) in map.tiles.iter().enumerate() {
            for (column, &code) in codes.iter().enumerate() {
                let index = row * grid.stride() + column;
                grid.cells[index].kind = TerrainKind::from_code(code);
            }
        }

        for decoration in &map.decorations {
            if let Some(index) = grid.index(CellCoord::new(decoration.x, decoration.y)) {
                grid.cells[index].decor = Some(DecorTag::new(decoration.tag.clone()));
            }
        }

        Ok(grid)
    }

    /// Restarts the version counter past `previous` so a replacement grid never
    /// reuses a version observed on the grid it replaces.
    pub(crate) fn continue_versions_from(&mut self, previous: u64) {
        self.version = previous.saturating_add(1);
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Version incremented by every cell mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major flat index of the coordinate.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        row.checked_mul(self.stride())?.checked_add(column)
    }

    /// Coordinate stored at a flat index.
    #[must_use]
    pub fn coord_at(&self, index: usize) -> Option<CellCoord> {
        self.cells.get(index).map(Cell::coord)
    }

    /// Cell at the provided coordinate.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Terrain at the provided coordinate.
    #[must_use]
    pub fn terrain(&self, cell: CellCoord) -> Option<TerrainKind> {
        self.cell(cell).map(Cell::kind)
    }

    /// Reports whether enemies may stand on the coordinate.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.terrain(cell).is_some_and(TerrainKind::is_walkable)
    }

    /// Reports whether enemies may stand on the cell at a flat index.
    #[must_use]
    pub fn is_walkable_at(&self, index: usize) -> bool {
        self.cells
            .get(index)
            .is_some_and(|cell| cell.kind.is_walkable())
    }

    /// Iterator over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Assigns terrain to a cell, returning whether anything changed.
    pub fn set_terrain(&mut self, cell: CellCoord, kind: TerrainKind) -> Result<bool, EditError> {
        let index = self.index(cell).ok_or(EditError::OutOfBounds)?;
        let slot = &mut self.cells[index];
        if slot.kind == kind {
            return Ok(false);
        }

        slot.kind = kind;
        self.version = self.version.saturating_add(1);
        Ok(true)
    }

    /// Places or clears a decoration, returning whether anything changed.
    pub fn set_decor(
        &mut self,
        cell: CellCoord,
        decor: Option<DecorTag>,
    ) -> Result<bool, EditError> {
        let index = self.index(cell).ok_or(EditError::OutOfBounds)?;
        let slot = &mut self.cells[index];
        if slot.decor == decor {
            return Ok(false);
        }

        slot.decor = decor;
        self.version = self.version.saturating_add(1);
        Ok(true)
    }

    /// Terrain codes laid out as `tiles[row][column]` for persistence.
    #[must_use]
    pub fn terrain_codes(&self) -> Vec<Vec<i32>> {
        if self.stride() == 0 {
            return Vec::new();
        }

        self.cells
            .chunks(self.stride())
            .map(|row| row.iter().map(|cell| cell.kind.code()).collect())
            .collect()
    }

    fn stride(&self) -> usize {
        usize::try_from(self.columns).unwrap_or(0)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(0, 0, TerrainKind::Grass)
    }
}
