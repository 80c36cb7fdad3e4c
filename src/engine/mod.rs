// src/engine/mod.rs

//! The automaton engine contract.
//!
//! The viewport controller treats the engine as an opaque collaborator: it
//! creates one through an [`EngineFactory`], drives it through the
//! [`Engine`] trait, and consumes the change information each mutating
//! call reports. Everything about cell storage, the transition rule, and
//! how changes are computed stays behind the trait; the concrete Game of
//! Life implementation lives in [`life`].

use serde::{Deserialize, Serialize};

pub mod life;

/// The state of a single cell.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Dead = 0,
    Alive = 1,
}

impl Cell {
    /// Flips between `Dead` and `Alive`.
    pub fn toggled(self) -> Cell {
        match self {
            Cell::Dead => Cell::Alive,
            Cell::Alive => Cell::Dead,
        }
    }
}

/// How a freshly created or reseeded grid is populated.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedMode {
    Blank = 0,
    Random = 1,
}

impl SeedMode {
    /// The next mode in the seed-mode selector's cycle order.
    pub fn next(self) -> SeedMode {
        match self {
            SeedMode::Blank => SeedMode::Random,
            SeedMode::Random => SeedMode::Blank,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeedMode::Blank => "blank",
            SeedMode::Random => "random",
        }
    }
}

/// Orientation of a glider stamp, named for the corner it travels toward.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GliderDirection {
    Nw = 0,
    Ne = 1,
    Sw = 2,
    Se = 3,
}

impl GliderDirection {
    pub fn label(self) -> &'static str {
        match self {
            GliderDirection::Nw => "NW",
            GliderDirection::Ne => "NE",
            GliderDirection::Sw => "SW",
            GliderDirection::Se => "SE",
        }
    }
}

/// Per-cell entry in the changed-cell bitmap an engine reports after every
/// mutating call. The numeric codes match the engine wire contract:
/// 0 = unchanged, 1 = changed to dead, 2 = changed to alive.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellDelta {
    Unchanged = 0,
    WentDead = 1,
    WentAlive = 2,
}

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridSize {
    pub rows: u16,
    pub cols: u16,
}

impl GridSize {
    pub const fn new(rows: u16, cols: u16) -> Self {
        GridSize { rows, cols }
    }

    /// Number of cells in the grid.
    pub fn len(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// A (row, column) cell address. Valid iff both components are inside the
/// current grid dimensions; validity is always re-checked against the grid
/// at hand since addresses are computed per pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridAddress {
    pub row: u16,
    pub col: u16,
}

impl GridAddress {
    pub const fn new(row: u16, col: u16) -> Self {
        GridAddress { row, col }
    }

    pub fn in_bounds(&self, size: GridSize) -> bool {
        self.row < size.rows && self.col < size.cols
    }

    /// Row-major linear index of this address.
    pub fn index(&self, size: GridSize) -> usize {
        self.row as usize * size.cols as usize + self.col as usize
    }
}

/// Decodes a row-major linear index back into a (row, column) address,
/// using the same arithmetic as the engine's linearization:
/// `col = index % cols`, `row = (index - col) / cols`.
pub fn decode_index(index: usize, size: GridSize) -> GridAddress {
    let cols = size.cols as usize;
    let col = index % cols;
    let row = (index - col) / cols;
    GridAddress::new(row as u16, col as u16)
}

/// The result of placing a 3x3 glider stamp: nine (linear index, resulting
/// state) pairs, in row-major order over the stamp's footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GliderStamp {
    pub cells: [(usize, Cell); 9],
}

/// The abstract automaton engine.
///
/// Exactly one engine instance is live at a time, owned by the
/// `EngineAdapter`; the adapter destroys and replaces it (never resizes it
/// in place) when dimensions or seed mode change.
///
/// Change bitmaps returned by `step`/`reseed`/`changes` are borrowed views
/// into engine-owned storage and are valid only until the next mutating
/// call on the same engine.
pub trait Engine {
    /// Current grid dimensions.
    fn dimensions(&self) -> GridSize;

    /// Advances the automaton one generation and reports which cells
    /// changed.
    fn step(&mut self) -> &[CellDelta];

    /// Repopulates the grid at its current dimensions. The returned bitmap
    /// marks every cell changed, so consumers perform a full redraw.
    fn reseed(&mut self, mode: SeedMode) -> &[CellDelta];

    /// Flips a single cell and returns its new state, or `None` (with no
    /// mutation) if the address is out of bounds.
    fn toggle_cell(&mut self, addr: GridAddress) -> Option<Cell>;

    /// Places a 3x3 glider stamp anchored at `addr`. Returns `None` (with
    /// no mutation at all) if any of the nine cells would fall outside the
    /// grid; partial stamps are never applied.
    fn toggle_glider(&mut self, addr: GridAddress, dir: GliderDirection) -> Option<GliderStamp>;

    /// The changed-cell bitmap produced by the most recent mutating call
    /// (including construction, which counts as a reseed).
    fn changes(&self) -> &[CellDelta];
}

/// Creates engine instances. The adapter holds one of these so it can
/// rebuild the engine whenever dimensions or seed mode change.
pub type EngineFactory = Box<dyn Fn(GridSize, SeedMode) -> Box<dyn Engine>>;
