//! Player-built walls and the registry that stores them.

use std::collections::BTreeMap;

use citadel_defence_core::{validate_position, CellCoord, EntityError, Grid, WallSnapshot};

/// Obstacle covering a single cell. Survives one hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wall {
    cell: CellCoord,
    damaged: bool,
}

impl Wall {
    /// Creates an undamaged wall. Reserved cells and cells outside the grid
    /// are rejected.
    pub fn new(cell: CellCoord, grid: &Grid) -> Result<Self, EntityError> {
        validate_position(grid, cell.to_point())?;
        if grid.is_reserved(cell) {
            return Err(EntityError::Reserved(cell));
        }
        Ok(Self {
            cell,
            damaged: false,
        })
    }

    /// Cell the wall covers.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Whether the wall already absorbed a hit.
    #[must_use]
    pub const fn damaged(&self) -> bool {
        self.damaged
    }
}

/// Outcome of a robot running into a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Impact {
    /// First hit; the wall stands.
    Damaged,
    /// Second hit; the wall is gone.
    Destroyed,
}

/// Standing walls keyed by cell. At most one wall per cell.
#[derive(Debug, Default)]
pub(crate) struct WallRegistry {
    entries: BTreeMap<CellCoord, Wall>,
}

impl WallRegistry {
    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        self.entries.contains_key(&cell)
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<&Wall> {
        self.entries.get(&cell)
    }

    /// Inserts the wall unless its cell is already covered.
    pub(crate) fn insert(&mut self, wall: Wall) -> bool {
        if self.contains(wall.cell()) {
            return false;
        }
        let _ = self.entries.insert(wall.cell(), wall);
        true
    }

    /// Applies a robot hit to the wall on `cell`, if there is one.
    pub(crate) fn strike(&mut self, cell: CellCoord) -> Option<Impact> {
        let wall = self.entries.get_mut(&cell)?;
        if wall.damaged {
            let _ = self.entries.remove(&cell);
            Some(Impact::Destroyed)
        } else {
            wall.damaged = true;
            Some(Impact::Damaged)
        }
    }

    pub(crate) fn snapshots(&self) -> Vec<WallSnapshot> {
        self.entries
            .values()
            .map(|wall| WallSnapshot {
                cell: wall.cell,
                damaged: wall.damaged,
            })
            .collect()
    }
}
