//! Grid occupancy model.
//!
//! The grid is the single source of truth for which cell holds what. Cells
//! store a state tag plus an entity handle; entity data lives in
//! [`crate::entities::EntityStorage`]. All mutation goes through
//! [`Grid::place_unit`] / [`Grid::remove_unit`] (and their footprint
//! variants) so the cell invariant cannot be broken from outside.
//!
//! # Invariant
//!
//! For every cell: `state == Empty` if and only if `occupant == None`.

use serde::{Deserialize, Serialize};

use crate::entities::EntityId;
use crate::math::{fixed_serde, Fixed, WorldVec2};

/// Cell coordinate. Signed so neighbor and offset math never underflows;
/// validity against the bounds is a separate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    /// Column, 0-based from the west edge.
    pub x: i32,
    /// Row, 0-based from the south edge. North is +y.
    pub y: i32,
}

impl GridPos {
    /// Create a cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by a delta.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What currently occupies a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Nothing here.
    #[default]
    Empty,
    /// A player-team unit.
    PlayerUnit,
    /// An enemy-team unit.
    EnemyUnit,
    /// A resource node (possibly one cell of a larger footprint).
    Resource,
}

/// A single grid cell: state tag plus occupant handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    /// Occupancy tag.
    pub state: CellState,
    /// Handle of the occupying entity, if any.
    pub occupant: Option<EntityId>,
}

impl GridCell {
    /// An empty cell.
    pub const EMPTY: Self = Self {
        state: CellState::Empty,
        occupant: None,
    };

    /// Whether nothing occupies this cell.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.state, CellState::Empty)
    }
}

/// Where an occupant ended up after a [`Grid::resize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeReport {
    /// Cell offset applied to every surviving occupant.
    pub offset: (i32, i32),
    /// Occupants relocated by `offset`, ascending by id.
    pub relocated: Vec<EntityId>,
    /// Occupants whose footprint no longer fit, ascending by id.
    pub dropped: Vec<EntityId>,
}

/// Rectangular cell grid, row-major, centered on the world origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    #[serde(with = "fixed_serde")]
    cell_size: Fixed,
    cells: Vec<GridCell>,
}

impl Grid {
    /// Create an empty grid. Zero dimensions are clamped to 1.
    #[must_use]
    pub fn new(width: u32, height: u32, cell_size: Fixed) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cell_size,
            cells: vec![GridCell::EMPTY; (width * height) as usize],
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// World-space edge length of one cell.
    #[must_use]
    pub const fn cell_size(&self) -> Fixed {
        self.cell_size
    }

    /// Whether the coordinate lies inside the bounds.
    #[must_use]
    pub const fn is_valid_cell(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: GridPos) -> usize {
        debug_assert!(self.is_valid_cell(pos));
        (pos.y as u32 * self.width + pos.x as u32) as usize
    }

    /// The cell at `pos`, or `None` out of bounds.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<&GridCell> {
        if self.is_valid_cell(pos) {
            Some(&self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// Occupancy tag at `pos`, or `None` out of bounds.
    #[must_use]
    pub fn cell_state(&self, pos: GridPos) -> Option<CellState> {
        self.cell(pos).map(|c| c.state)
    }

    /// Occupant handle at `pos`, if in bounds and occupied.
    #[must_use]
    pub fn cell_occupant(&self, pos: GridPos) -> Option<EntityId> {
        self.cell(pos).and_then(|c| c.occupant)
    }

    /// Whether `pos` is in bounds and unoccupied. Out-of-bounds counts as
    /// not empty so movement and placement stop at the edge.
    #[must_use]
    pub fn is_cell_empty(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(GridCell::is_empty)
    }

    /// Register an occupant in a single cell.
    ///
    /// The sole single-cell mutation entry point. Returns `false` without
    /// mutating if the cell is out of bounds, already occupied, or `state`
    /// is [`CellState::Empty`].
    pub fn place_unit(&mut self, pos: GridPos, occupant: EntityId, state: CellState) -> bool {
        if state == CellState::Empty || !self.is_cell_empty(pos) {
            return false;
        }
        let idx = self.index(pos);
        self.cells[idx] = GridCell {
            state,
            occupant: Some(occupant),
        };
        true
    }

    /// Clear a single cell, returning the handle that was there.
    ///
    /// Idempotent: clearing an empty or out-of-bounds cell does nothing.
    pub fn remove_unit(&mut self, pos: GridPos) -> Option<EntityId> {
        if !self.is_valid_cell(pos) {
            return None;
        }
        let idx = self.index(pos);
        let previous = self.cells[idx].occupant;
        self.cells[idx] = GridCell::EMPTY;
        previous
    }

    /// Register an occupant across a whole footprint.
    ///
    /// Checks every covered cell first; commits only if all are empty, so a
    /// failed placement leaves the grid untouched.
    pub fn place_footprint(
        &mut self,
        cells: impl IntoIterator<Item = GridPos> + Clone,
        occupant: EntityId,
        state: CellState,
    ) -> bool {
        if state == CellState::Empty {
            return false;
        }
        if !cells.clone().into_iter().all(|pos| self.is_cell_empty(pos)) {
            return false;
        }
        for pos in cells {
            let idx = self.index(pos);
            self.cells[idx] = GridCell {
                state,
                occupant: Some(occupant),
            };
        }
        true
    }

    /// Clear every cell of a footprint. Idempotent like [`Grid::remove_unit`].
    pub fn remove_footprint(&mut self, cells: impl IntoIterator<Item = GridPos>) {
        for pos in cells {
            let _ = self.remove_unit(pos);
        }
    }

    /// Number of cells carrying the given tag.
    #[must_use]
    pub fn count_cells(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| c.state == state).count()
    }

    /// Cell center in world space. The grid is centered on the origin, so
    /// cell `(0,0)` of a 3x3 grid sits at `(-cell_size, -cell_size)`.
    #[must_use]
    pub fn grid_to_world(&self, pos: GridPos) -> WorldVec2 {
        let half = Fixed::from_num(2);
        let offset_x = Fixed::from_num(self.width as i32 - 1) * self.cell_size / half;
        let offset_y = Fixed::from_num(self.height as i32 - 1) * self.cell_size / half;
        WorldVec2::new(
            Fixed::from_num(pos.x) * self.cell_size - offset_x,
            Fixed::from_num(pos.y) * self.cell_size - offset_y,
        )
    }

    /// Nearest cell coordinate for a world-space point. Inverse of
    /// [`Grid::grid_to_world`]; the result may be out of bounds.
    #[must_use]
    pub fn world_to_grid(&self, world: WorldVec2) -> GridPos {
        let half = Fixed::from_num(2);
        let offset_x = Fixed::from_num(self.width as i32 - 1) * self.cell_size / half;
        let offset_y = Fixed::from_num(self.height as i32 - 1) * self.cell_size / half;
        GridPos::new(
            ((world.x + offset_x) / self.cell_size).round().to_num::<i32>(),
            ((world.y + offset_y) / self.cell_size).round().to_num::<i32>(),
        )
    }

    /// Resize to new bounds, keeping occupants centered.
    ///
    /// Every occupant shifts by `(new - old) / 2` per axis. An occupant
    /// whose full footprint no longer fits is dropped from the grid; the
    /// caller owns removing it from storage. Zero dimensions are clamped
    /// to 1.
    pub fn resize(&mut self, new_width: u32, new_height: u32) -> ResizeReport {
        let new_width = new_width.max(1);
        let new_height = new_height.max(1);
        let offset = (
            (new_width as i32 - self.width as i32) / 2,
            (new_height as i32 - self.height as i32) / 2,
        );

        // Gather each occupant's covered cells in row-major order so the
        // report is deterministic.
        let mut footprints: Vec<(EntityId, CellState, Vec<GridPos>)> = Vec::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let pos = GridPos::new(x, y);
                let cell = self.cells[self.index(pos)];
                if let Some(id) = cell.occupant {
                    match footprints.iter_mut().find(|(fid, _, _)| *fid == id) {
                        Some((_, _, cells)) => cells.push(pos),
                        None => footprints.push((id, cell.state, vec![pos])),
                    }
                }
            }
        }

        self.width = new_width;
        self.height = new_height;
        self.cells = vec![GridCell::EMPTY; (new_width * new_height) as usize];

        let mut report = ResizeReport {
            offset,
            ..ResizeReport::default()
        };
        for (id, state, cells) in footprints {
            let shifted: Vec<GridPos> = cells.iter().map(|p| p.offset(offset.0, offset.1)).collect();
            if shifted.iter().all(|p| self.is_valid_cell(*p)) {
                for pos in shifted {
                    let idx = self.index(pos);
                    self.cells[idx] = GridCell {
                        state,
                        occupant: Some(id),
                    };
                }
                report.relocated.push(id);
            } else {
                report.dropped.push(id);
            }
        }
        report.relocated.sort_unstable();
        report.dropped.sort_unstable();
        report
    }
}
