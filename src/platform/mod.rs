// src/platform/mod.rs

//! The surface driver boundary.
//!
//! A [`SurfaceDriver`] owns the host surface: it reports input as
//! [`BackendEvent`]s, answers size queries at call time, and executes
//! batched [`DrawCommand`]s produced by the renderer. The controller never
//! reads pixel state back; the surface is write-only from its point of
//! view.

use anyhow::Result;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;

pub mod console;
#[cfg(test)]
pub mod mock;

bitflags! {
    /// Modifier keys attached to key and pointer events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
    }
}

/// Abstract key representation; just enough for the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    Char(char),
    Escape,
    Enter,
    Unknown(u8),
}

/// Events originating from the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// A pointer button was pressed at surface-local pixel coordinates.
    PointerPress {
        x_px: u32,
        y_px: u32,
        modifiers: Modifiers,
    },
    /// A key was pressed.
    Key {
        symbol: KeySymbol,
        modifiers: Modifiers,
    },
    /// The surface was resized; dimensions are the new drawable area.
    Resize { width_px: u32, height_px: u32 },
    /// The host asked the application to close.
    CloseRequested,
}

/// Drawing commands executed by a driver. The renderer batches cells by
/// color: one `SetFillColor` per pass, then the rectangles painted with
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// Clears the whole drawable area with the given color.
    ClearAll { color: Rgb },
    /// Sets the fill color used by subsequent `FillRect` commands.
    SetFillColor { color: Rgb },
    /// Fills a rectangle, in surface pixels.
    FillRect {
        x_px: u32,
        y_px: u32,
        width_px: u32,
        height_px: u32,
    },
    /// Replaces the status line (generation display / control hints).
    StatusText { text: String },
    /// Flushes the composed frame to the display.
    Present,
}

/// The host-surface contract the viewport controller draws against.
pub trait SurfaceDriver {
    /// Translates pending native input into [`BackendEvent`]s. Returns an
    /// empty vector when nothing happened.
    fn process_events(&mut self) -> Result<Vec<BackendEvent>>;

    /// The current drawable area in pixels, read from the host at call
    /// time (never cached by callers).
    fn surface_size_px(&self) -> (u32, u32);

    /// Executes a batch of drawing commands. A [`DrawCommand::Present`]
    /// in the batch flushes everything composed so far to the display.
    fn execute(&mut self, commands: Vec<DrawCommand>) -> Result<()>;

    /// Releases host resources (restores terminal modes, etc.).
    /// Idempotent; also invoked from `Drop` by implementations that hold
    /// host state.
    fn cleanup(&mut self) -> Result<()>;
}
