// src/engine/life.rs

//! Conway's Game of Life engine.
//!
//! Storage is a row-major `Vec<Cell>` with a ping-pong back buffer for the
//! step transition and a single change buffer that every mutating call
//! rewrites. The step rule wraps toroidally at the grid edges; glider
//! stamps do not wrap and are rejected whole if their 3x3 footprint would
//! leave the grid.

use log::debug;
use rand::Rng;

use super::{Cell, CellDelta, Engine, GliderDirection, GliderStamp, GridAddress, GridSize, SeedMode};

/// Fraction of cells seeded alive by `SeedMode::Random`.
const RANDOM_ALIVE_FRACTION: f32 = 0.1;

pub struct LifeUniverse {
    size: GridSize,
    cells: Vec<Cell>,
    cells_next: Vec<Cell>,
    changes: Vec<CellDelta>,
}

impl LifeUniverse {
    /// Creates a universe populated per `mode`. The change buffer after
    /// construction marks every cell, so the first consumer performs a
    /// full redraw.
    pub fn new(size: GridSize, mode: SeedMode) -> Self {
        let len = size.len();
        let mut universe = LifeUniverse {
            size,
            cells: vec![Cell::Dead; len],
            cells_next: vec![Cell::Dead; len],
            changes: vec![CellDelta::Unchanged; len],
        };
        universe.populate(mode);
        debug!(
            "LifeUniverse: created {}x{} ({} cells), seed mode {:?}",
            size.rows, size.cols, len, mode
        );
        universe
    }

    fn index(&self, row: u16, col: u16) -> usize {
        row as usize * self.size.cols as usize + col as usize
    }

    /// Live-neighbor count with toroidal wrapping.
    fn live_neighbor_count(&self, row: u16, col: u16) -> u8 {
        let north = if row == 0 { self.size.rows - 1 } else { row - 1 };
        let south = if row == self.size.rows - 1 { 0 } else { row + 1 };
        let west = if col == 0 { self.size.cols - 1 } else { col - 1 };
        let east = if col == self.size.cols - 1 { 0 } else { col + 1 };

        let mut count = 0u8;
        for (r, c) in [
            (north, west),
            (north, col),
            (north, east),
            (row, west),
            (row, east),
            (south, west),
            (south, col),
            (south, east),
        ] {
            count += self.cells[self.index(r, c)] as u8;
        }
        count
    }

    fn populate(&mut self, mode: SeedMode) {
        match mode {
            SeedMode::Random => {
                let mut rng = rand::thread_rng();
                for i in 0..self.cells.len() {
                    if rng.gen_range(0.0..1.0f32) < RANDOM_ALIVE_FRACTION {
                        self.cells[i] = Cell::Alive;
                        self.changes[i] = CellDelta::WentAlive;
                    } else {
                        self.cells[i] = Cell::Dead;
                        self.changes[i] = CellDelta::WentDead;
                    }
                }
            }
            SeedMode::Blank => {
                for i in 0..self.cells.len() {
                    self.cells[i] = Cell::Dead;
                    self.changes[i] = CellDelta::WentDead;
                }
            }
        }
    }

    fn clear_changes(&mut self) {
        self.changes.fill(CellDelta::Unchanged);
    }
}

impl Engine for LifeUniverse {
    fn dimensions(&self) -> GridSize {
        self.size
    }

    fn step(&mut self) -> &[CellDelta] {
        for row in 0..self.size.rows {
            for col in 0..self.size.cols {
                let idx = self.index(row, col);
                let cell = self.cells[idx];
                let live_neighbors = self.live_neighbor_count(row, col);

                match (cell, live_neighbors) {
                    (Cell::Alive, n) if !(2..=3).contains(&n) => {
                        self.cells_next[idx] = Cell::Dead;
                        self.changes[idx] = CellDelta::WentDead;
                    }
                    (Cell::Dead, 3) => {
                        self.cells_next[idx] = Cell::Alive;
                        self.changes[idx] = CellDelta::WentAlive;
                    }
                    (unchanged, _) => {
                        self.cells_next[idx] = unchanged;
                        self.changes[idx] = CellDelta::Unchanged;
                    }
                }
            }
        }
        std::mem::swap(&mut self.cells, &mut self.cells_next);
        &self.changes
    }

    fn reseed(&mut self, mode: SeedMode) -> &[CellDelta] {
        self.populate(mode);
        &self.changes
    }

    fn toggle_cell(&mut self, addr: GridAddress) -> Option<Cell> {
        if !addr.in_bounds(self.size) {
            return None;
        }
        let idx = addr.index(self.size);
        self.cells[idx] = self.cells[idx].toggled();
        let new_state = self.cells[idx];

        self.clear_changes();
        self.changes[idx] = match new_state {
            Cell::Alive => CellDelta::WentAlive,
            Cell::Dead => CellDelta::WentDead,
        };
        Some(new_state)
    }

    fn toggle_glider(&mut self, addr: GridAddress, dir: GliderDirection) -> Option<GliderStamp> {
        // The whole 3x3 footprint must fit; partial stamps are never applied.
        if addr.row == 0
            || addr.col == 0
            || addr.row + 1 >= self.size.rows
            || addr.col + 1 >= self.size.cols
        {
            debug!(
                "LifeUniverse: glider at ({}, {}) would leave the {}x{} grid, rejected",
                addr.row, addr.col, self.size.rows, self.size.cols
            );
            return None;
        }

        // Row-major 3x3 patterns, one per travel direction.
        const A: Cell = Cell::Alive;
        const D: Cell = Cell::Dead;
        let pattern: [Cell; 9] = match dir {
            GliderDirection::Nw => [A, A, A, A, D, D, D, A, D],
            GliderDirection::Ne => [A, A, A, D, D, A, D, A, D],
            GliderDirection::Sw => [D, A, D, A, D, D, A, A, A],
            GliderDirection::Se => [D, A, D, D, D, A, A, A, A],
        };

        self.clear_changes();
        let mut cells = [(0usize, Cell::Dead); 9];
        for (slot, (dr, dc)) in (-1i32..=1).flat_map(|r| (-1i32..=1).map(move |c| (r, c))).enumerate()
        {
            let row = (addr.row as i32 + dr) as u16;
            let col = (addr.col as i32 + dc) as u16;
            let idx = self.index(row, col);
            let state = pattern[slot];
            self.cells[idx] = state;
            self.changes[idx] = match state {
                Cell::Alive => CellDelta::WentAlive,
                Cell::Dead => CellDelta::WentDead,
            };
            cells[slot] = (idx, state);
        }
        Some(GliderStamp { cells })
    }

    fn changes(&self) -> &[CellDelta] {
        &self.changes
    }
}
