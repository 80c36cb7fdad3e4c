// src/adapter.rs

//! Owns the live engine instance and keeps it in sync with the dimension
//! and seed-mode parameters.
//!
//! The engine is never resized or re-seeded in place by this layer's
//! rebuild path: when the grid dimensions change the adapter drops the old
//! handle and creates a fresh one, so exactly one engine is live at any
//! time. All engine traffic from the rest of the controller goes through
//! these pass-through methods, which also maintain the generation counter:
//! steps increment it, reseeds and rebuilds zero it, edits leave it alone.

use log::{debug, info};

use crate::engine::{
    Cell, CellDelta, Engine, EngineFactory, GliderDirection, GliderStamp, GridAddress, GridSize,
    SeedMode,
};
use crate::params::Observable;

pub struct EngineAdapter {
    engine: Box<dyn Engine>,
    factory: EngineFactory,
    generations: Observable<u64>,
}

impl EngineAdapter {
    /// Creates the first engine. The creation bitmap (every cell changed)
    /// is left in the engine for the caller to consume via [`Self::changes`].
    pub fn new(
        factory: EngineFactory,
        size: GridSize,
        mode: SeedMode,
        generations: Observable<u64>,
    ) -> Self {
        info!(
            "EngineAdapter: creating engine {}x{}, seed mode {:?}",
            size.rows, size.cols, mode
        );
        let engine = (factory)(size, mode);
        generations.set(0);
        EngineAdapter {
            engine,
            factory,
            generations,
        }
    }

    pub fn dimensions(&self) -> GridSize {
        self.engine.dimensions()
    }

    /// Destroys the current engine and creates a new one. Called whenever
    /// the dimension or seed-mode parameter changes. The new engine's
    /// change bitmap marks every cell, so the caller performs a full
    /// redraw from [`Self::changes`].
    pub fn rebuild(&mut self, size: GridSize, mode: SeedMode) {
        info!(
            "EngineAdapter: rebuilding engine {}x{} -> {}x{}, seed mode {:?}",
            self.engine.dimensions().rows,
            self.engine.dimensions().cols,
            size.rows,
            size.cols,
            mode
        );
        self.engine = (self.factory)(size, mode);
        self.generations.set(0);
    }

    /// Advances one generation; increments the generation counter.
    pub fn step(&mut self) -> &[CellDelta] {
        let next = self.generations.get() + 1;
        self.generations.set(next);
        self.engine.step()
    }

    /// Repopulates at current dimensions; zeroes the generation counter.
    pub fn reseed(&mut self, mode: SeedMode) -> &[CellDelta] {
        debug!("EngineAdapter: reseeding with {:?}", mode);
        self.generations.set(0);
        self.engine.reseed(mode)
    }

    /// Flips one cell. Out-of-bounds addresses are discarded by the
    /// engine; toggles never advance the generation counter.
    pub fn toggle_cell(&mut self, addr: GridAddress) -> Option<(GridAddress, Cell)> {
        self.engine.toggle_cell(addr).map(|cell| (addr, cell))
    }

    /// Places a glider stamp, all-or-nothing.
    pub fn toggle_glider(
        &mut self,
        addr: GridAddress,
        dir: GliderDirection,
    ) -> Option<GliderStamp> {
        self.engine.toggle_glider(addr, dir)
    }

    /// The change bitmap from the engine's most recent mutation (or from
    /// its creation). Valid until the next mutating call.
    pub fn changes(&self) -> &[CellDelta] {
        self.engine.changes()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records engine calls and serves canned change bitmaps, in the
    /// spirit of the mock collaborators the orchestrator tests use.
    pub struct MockEngine {
        pub size: GridSize,
        pub mode: SeedMode,
        pub changes: Vec<CellDelta>,
        pub steps: Rc<RefCell<u32>>,
        pub reseeds: Rc<RefCell<Vec<SeedMode>>>,
    }

    impl MockEngine {
        pub fn new(size: GridSize, mode: SeedMode) -> Self {
            MockEngine {
                size,
                mode,
                changes: vec![CellDelta::WentDead; size.len()],
                steps: Rc::new(RefCell::new(0)),
                reseeds: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl Engine for MockEngine {
        fn dimensions(&self) -> GridSize {
            self.size
        }

        fn step(&mut self) -> &[CellDelta] {
            *self.steps.borrow_mut() += 1;
            self.changes.fill(CellDelta::Unchanged);
            &self.changes
        }

        fn reseed(&mut self, mode: SeedMode) -> &[CellDelta] {
            self.reseeds.borrow_mut().push(mode);
            self.changes.fill(CellDelta::WentDead);
            &self.changes
        }

        fn toggle_cell(&mut self, addr: GridAddress) -> Option<Cell> {
            if addr.in_bounds(self.size) {
                Some(Cell::Alive)
            } else {
                None
            }
        }

        fn toggle_glider(&mut self, addr: GridAddress, _dir: GliderDirection) -> Option<GliderStamp> {
            if addr.row == 0
                || addr.col == 0
                || addr.row + 1 >= self.size.rows
                || addr.col + 1 >= self.size.cols
            {
                return None;
            }
            Some(GliderStamp {
                cells: [(addr.index(self.size), Cell::Alive); 9],
            })
        }

        fn changes(&self) -> &[CellDelta] {
            &self.changes
        }
    }

    pub fn mock_factory() -> EngineFactory {
        Box::new(|size, mode| Box::new(MockEngine::new(size, mode)))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::mock_factory;
    use super::*;
    use test_log::test;

    fn adapter() -> (EngineAdapter, Observable<u64>) {
        let generations = Observable::new("generations", 0u64);
        let adapter = EngineAdapter::new(
            mock_factory(),
            GridSize::new(10, 10),
            SeedMode::Blank,
            generations.clone(),
        );
        (adapter, generations)
    }

    #[test]
    fn step_increments_the_generation_counter() {
        let (mut adapter, generations) = adapter();
        adapter.step();
        adapter.step();
        assert_eq!(generations.get(), 2);
    }

    #[test]
    fn toggles_do_not_advance_generations() {
        let (mut adapter, generations) = adapter();
        adapter.step();
        adapter.toggle_cell(GridAddress::new(3, 4));
        adapter.toggle_glider(GridAddress::new(5, 5), GliderDirection::Nw);
        assert_eq!(generations.get(), 1);
    }

    #[test]
    fn reseed_zeroes_generations() {
        let (mut adapter, generations) = adapter();
        adapter.step();
        adapter.step();
        adapter.reseed(SeedMode::Random);
        assert_eq!(generations.get(), 0);
    }

    #[test]
    fn rebuild_replaces_the_engine_and_zeroes_generations() {
        let (mut adapter, generations) = adapter();
        adapter.step();
        adapter.rebuild(GridSize::new(20, 30), SeedMode::Random);
        assert_eq!(adapter.dimensions(), GridSize::new(20, 30));
        assert_eq!(generations.get(), 0);
        // The fresh engine's bitmap marks every cell for the full redraw.
        assert_eq!(adapter.changes().len(), 600);
        assert!(adapter.changes().iter().all(|d| *d != CellDelta::Unchanged));
    }

    #[test]
    fn out_of_bounds_toggle_passes_the_discard_through() {
        let (mut adapter, _) = adapter();
        assert!(adapter.toggle_cell(GridAddress::new(10, 10)).is_none());
    }
}
