// src/render.rs

//! Translates engine change reports into batched drawing commands.
//!
//! Only cells reported changed are repainted, so a frame's drawing cost
//! scales with the number of changed cells, never with grid size. Each
//! batch makes two passes over the changed set: every cell that went dead
//! is painted first under a single fill-color switch, then every cell that
//! went alive under a second one — one color set per pass instead of one
//! per cell.

use log::trace;

use crate::color::Rgb;
use crate::engine::{decode_index, Cell, CellDelta, GliderStamp, GridAddress, GridSize};
use crate::platform::DrawCommand;

/// Colors the renderer paints with.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub alive: Rgb,
    pub dead: Rgb,
    pub background: Rgb,
}

pub struct DirtyRegionRenderer {
    palette: Palette,
    /// Gap between adjacent cells, in surface pixels.
    border: u16,
}

impl DirtyRegionRenderer {
    pub fn new(palette: Palette, border: u16) -> Self {
        DirtyRegionRenderer { palette, border }
    }

    fn cell_rect(&self, addr: GridAddress, pixel_size: u16) -> DrawCommand {
        let stride = pixel_size as u32 + self.border as u32;
        DrawCommand::FillRect {
            x_px: addr.col as u32 * stride + self.border as u32,
            y_px: addr.row as u32 * stride + self.border as u32,
            width_px: pixel_size as u32,
            height_px: pixel_size as u32,
        }
    }

    fn two_pass<'a, I>(&self, cells: I, pixel_size: u16) -> Vec<DrawCommand>
    where
        I: Iterator<Item = (GridAddress, Cell)> + Clone,
    {
        let mut commands = Vec::new();

        let dead = cells.clone().filter(|(_, c)| *c == Cell::Dead);
        let mut any_dead = false;
        for (addr, _) in dead {
            if !any_dead {
                commands.push(DrawCommand::SetFillColor {
                    color: self.palette.dead,
                });
                any_dead = true;
            }
            commands.push(self.cell_rect(addr, pixel_size));
        }

        let alive = cells.filter(|(_, c)| *c == Cell::Alive);
        let mut any_alive = false;
        for (addr, _) in alive {
            if !any_alive {
                commands.push(DrawCommand::SetFillColor {
                    color: self.palette.alive,
                });
                any_alive = true;
            }
            commands.push(self.cell_rect(addr, pixel_size));
        }

        if !commands.is_empty() {
            commands.push(DrawCommand::Present);
        }
        commands
    }

    /// Commands repainting exactly the cells a change bitmap marks.
    /// Returns an empty batch (no present) when nothing changed.
    pub fn changed_cells(
        &self,
        deltas: &[CellDelta],
        size: GridSize,
        pixel_size: u16,
    ) -> Vec<DrawCommand> {
        let cells = deltas.iter().enumerate().filter_map(move |(idx, delta)| {
            let state = match delta {
                CellDelta::Unchanged => return None,
                CellDelta::WentDead => Cell::Dead,
                CellDelta::WentAlive => Cell::Alive,
            };
            Some((decode_index(idx, size), state))
        });
        let commands = self.two_pass(cells, pixel_size);
        trace!(
            "renderer: {} commands for change bitmap of {} cells",
            commands.len(),
            deltas.len()
        );
        commands
    }

    /// Commands repainting the nine cells of a glider stamp.
    pub fn stamp(&self, stamp: &GliderStamp, size: GridSize, pixel_size: u16) -> Vec<DrawCommand> {
        let cells = stamp
            .cells
            .iter()
            .map(move |(idx, state)| (decode_index(*idx, size), *state));
        self.two_pass(cells, pixel_size)
    }

    /// Commands repainting one toggled cell.
    pub fn single_cell(&self, addr: GridAddress, state: Cell, pixel_size: u16) -> Vec<DrawCommand> {
        let color = match state {
            Cell::Alive => self.palette.alive,
            Cell::Dead => self.palette.dead,
        };
        vec![
            DrawCommand::SetFillColor { color },
            self.cell_rect(addr, pixel_size),
            DrawCommand::Present,
        ]
    }

    /// A whole-surface repaint: clear to the background color, then paint
    /// every cell the bitmap marks. Used after engine recreation, whose
    /// bitmap marks all cells.
    pub fn full(&self, deltas: &[CellDelta], size: GridSize, pixel_size: u16) -> Vec<DrawCommand> {
        let mut commands = vec![DrawCommand::ClearAll {
            color: self.palette.background,
        }];
        commands.extend(self.changed_cells(deltas, size, pixel_size));
        if !commands.iter().any(|c| *c == DrawCommand::Present) {
            commands.push(DrawCommand::Present);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn renderer() -> DirtyRegionRenderer {
        DirtyRegionRenderer::new(
            Palette {
                alive: Rgb::BLACK,
                dead: Rgb::WHITE,
                background: Rgb::WHITE,
            },
            1,
        )
    }

    fn fill_color_switches(commands: &[DrawCommand]) -> Vec<Rgb> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetFillColor { color } => Some(*color),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_bitmap_produces_no_commands() {
        let size = GridSize::new(4, 4);
        let deltas = vec![CellDelta::Unchanged; size.len()];
        assert!(renderer().changed_cells(&deltas, size, 3).is_empty());
    }

    #[test]
    fn single_toggle_repaints_exactly_one_cell() {
        let size = GridSize::new(10, 10);
        let mut deltas = vec![CellDelta::Unchanged; size.len()];
        deltas[34] = CellDelta::WentAlive;
        let commands = renderer().changed_cells(&deltas, size, 3);
        // One color switch, one rect, one present.
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[1],
            DrawCommand::FillRect {
                // (row 3, col 4) at stride 4, border 1.
                x_px: 4 * 4 + 1,
                y_px: 3 * 4 + 1,
                width_px: 3,
                height_px: 3,
            }
        );
    }

    #[test]
    fn dead_cells_are_batched_before_alive_cells() {
        let size = GridSize::new(4, 4);
        let mut deltas = vec![CellDelta::Unchanged; size.len()];
        deltas[0] = CellDelta::WentAlive;
        deltas[5] = CellDelta::WentDead;
        deltas[7] = CellDelta::WentAlive;
        deltas[9] = CellDelta::WentDead;
        let commands = renderer().changed_cells(&deltas, size, 2);
        assert_eq!(fill_color_switches(&commands), vec![Rgb::WHITE, Rgb::BLACK]);
        // SetFillColor(dead), 2 rects, SetFillColor(alive), 2 rects, Present.
        assert_eq!(commands.len(), 7);
        assert_eq!(*commands.last().unwrap(), DrawCommand::Present);
    }

    #[test]
    fn stamp_decodes_indices_row_major() {
        let size = GridSize::new(10, 10);
        let stamp = GliderStamp {
            cells: [
                (0, Cell::Alive),
                (1, Cell::Alive),
                (2, Cell::Alive),
                (10, Cell::Alive),
                (11, Cell::Dead),
                (12, Cell::Dead),
                (20, Cell::Dead),
                (21, Cell::Alive),
                (22, Cell::Dead),
            ],
        };
        let commands = renderer().stamp(&stamp, size, 3);
        // 2 color switches + 9 rects + present.
        assert_eq!(commands.len(), 12);
        // Index 21 decodes to row 2, col 1.
        assert!(commands.contains(&DrawCommand::FillRect {
            x_px: 1 * 4 + 1,
            y_px: 2 * 4 + 1,
            width_px: 3,
            height_px: 3,
        }));
    }

    #[test]
    fn full_redraw_clears_first() {
        let size = GridSize::new(2, 2);
        let deltas = vec![CellDelta::WentDead; size.len()];
        let commands = renderer().full(&deltas, size, 3);
        assert_eq!(
            commands[0],
            DrawCommand::ClearAll { color: Rgb::WHITE }
        );
        assert_eq!(*commands.last().unwrap(), DrawCommand::Present);
    }
}
