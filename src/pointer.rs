// src/pointer.rs

//! Translates pointer clicks into grid edits.
//!
//! The hit test divides surface-local pixel coordinates by the cell
//! stride (pixel size plus border). Clicks outside the grid are discarded
//! silently. Whether a click toggles one cell or places a glider stamp is
//! decided by the glider-mode and glider-direction parameters, both read
//! at click time so control changes between clicks take effect on the
//! very next click.

use log::{debug, trace};

use crate::adapter::EngineAdapter;
use crate::engine::{Cell, GliderStamp, GridAddress, GridSize};
use crate::params::Observable;

/// The edit performed by a click, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerEdit {
    Cell(GridAddress, Cell),
    Stamp(GliderStamp),
}

pub struct PointerEditor {
    border: u16,
    glider_mode: Observable<bool>,
    glider_direction: Observable<crate::engine::GliderDirection>,
}

impl PointerEditor {
    pub fn new(
        border: u16,
        glider_mode: Observable<bool>,
        glider_direction: Observable<crate::engine::GliderDirection>,
    ) -> Self {
        PointerEditor {
            border,
            glider_mode,
            glider_direction,
        }
    }

    /// Maps pixel coordinates to a cell address, or `None` when the click
    /// lands outside the grid.
    pub fn hit_test(
        &self,
        x_px: u32,
        y_px: u32,
        pixel_size: u16,
        size: GridSize,
    ) -> Option<GridAddress> {
        let stride = (pixel_size as u32 + self.border as u32).max(1);
        let col = x_px / stride;
        let row = y_px / stride;
        if row >= size.rows as u32 || col >= size.cols as u32 {
            trace!(
                "pointer: click at ({}, {}) px maps to ({}, {}), outside {}x{} grid; discarded",
                x_px, y_px, row, col, size.rows, size.cols
            );
            return None;
        }
        Some(GridAddress::new(row as u16, col as u16))
    }

    /// Resolves a click into an engine edit. Returns `None` when the click
    /// was out of bounds or the stamp was rejected; either way there is
    /// nothing to render and no error to report.
    pub fn handle_click(
        &self,
        x_px: u32,
        y_px: u32,
        pixel_size: u16,
        adapter: &mut EngineAdapter,
    ) -> Option<PointerEdit> {
        let addr = self.hit_test(x_px, y_px, pixel_size, adapter.dimensions())?;

        if self.glider_mode.get() {
            let dir = self.glider_direction.get();
            debug!("pointer: glider {:?} at ({}, {})", dir, addr.row, addr.col);
            adapter.toggle_glider(addr, dir).map(PointerEdit::Stamp)
        } else {
            debug!("pointer: toggle at ({}, {})", addr.row, addr.col);
            adapter
                .toggle_cell(addr)
                .map(|(addr, cell)| PointerEdit::Cell(addr, cell))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::test_support::mock_factory;
    use crate::engine::{GliderDirection, SeedMode};
    use test_log::test;

    fn editor() -> PointerEditor {
        PointerEditor::new(
            1,
            Observable::new("glider_mode", false),
            Observable::new("glider_direction", GliderDirection::Nw),
        )
    }

    fn adapter(rows: u16, cols: u16) -> EngineAdapter {
        EngineAdapter::new(
            mock_factory(),
            GridSize::new(rows, cols),
            SeedMode::Blank,
            Observable::new("generations", 0),
        )
    }

    #[test]
    fn hit_test_floors_to_the_containing_cell() {
        let editor = editor();
        let size = GridSize::new(10, 10);
        // Stride is 4 (pixel size 3 + border 1).
        assert_eq!(editor.hit_test(0, 0, 3, size), Some(GridAddress::new(0, 0)));
        assert_eq!(editor.hit_test(3, 3, 3, size), Some(GridAddress::new(0, 0)));
        assert_eq!(editor.hit_test(4, 0, 3, size), Some(GridAddress::new(0, 1)));
        assert_eq!(
            editor.hit_test(17, 9, 3, size),
            Some(GridAddress::new(2, 4))
        );
    }

    #[test]
    fn clicks_past_the_grid_are_discarded() {
        let editor = editor();
        let size = GridSize::new(4, 4);
        assert_eq!(editor.hit_test(16, 0, 3, size), None);
        assert_eq!(editor.hit_test(0, 16, 3, size), None);
    }

    #[test]
    fn click_toggles_a_single_cell_outside_glider_mode() {
        let editor = editor();
        let mut adapter = adapter(10, 10);
        let edit = editor.handle_click(9, 13, 3, &mut adapter);
        assert_eq!(
            edit,
            Some(PointerEdit::Cell(GridAddress::new(3, 2), Cell::Alive))
        );
    }

    #[test]
    fn glider_mode_is_read_at_click_time() {
        let glider_mode = Observable::new("glider_mode", false);
        let editor = PointerEditor::new(
            1,
            glider_mode.clone(),
            Observable::new("glider_direction", GliderDirection::Nw),
        );
        let mut adapter = adapter(10, 10);

        let first = editor.handle_click(9, 9, 3, &mut adapter);
        assert!(matches!(first, Some(PointerEdit::Cell(..))));

        // Flipping the mode between clicks affects the very next click.
        glider_mode.set(true);
        let second = editor.handle_click(9, 9, 3, &mut adapter);
        assert!(matches!(second, Some(PointerEdit::Stamp(..))));
    }

    #[test]
    fn rejected_stamp_yields_no_edit() {
        let glider_mode = Observable::new("glider_mode", true);
        let editor = PointerEditor::new(
            1,
            glider_mode,
            Observable::new("glider_direction", GliderDirection::Nw),
        );
        let mut adapter = adapter(10, 10);
        // (0, 0) anchors a stamp that would leave the grid.
        assert_eq!(editor.handle_click(0, 0, 3, &mut adapter), None);
    }
}
