// src/controls.rs

//! Maps key events to control actions and enforces which actions each run
//! state accepts.
//!
//! The binder is the single gate between raw key input and the run-loop
//! and parameter layers: an action illegal in the current state is dropped
//! here, with a debug log, so downstream code only ever sees legal
//! requests. Pointer events bypass the binder entirely; grid edits are
//! accepted in every state.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::GliderDirection;
use crate::runloop::RunState;

/// Everything a key press can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
    Resume,
    Reset,
    PixelSizeUp,
    PixelSizeDown,
    CycleSeedMode,
    ToggleGliderMode,
    SelectDirection(GliderDirection),
    Quit,
}

/// Key-to-action bindings, overridable from the config file. Direction
/// selection is fixed to the digit keys 1 through 4.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub start: char,
    pub stop: char,
    pub resume: char,
    pub reset: char,
    pub pixel_size_up: char,
    pub pixel_size_down: char,
    pub cycle_seed_mode: char,
    pub toggle_glider_mode: char,
    pub quit: char,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        KeybindingsConfig {
            start: 's',
            stop: 'p',
            resume: 'r',
            reset: 'c',
            pixel_size_up: '+',
            pixel_size_down: '-',
            cycle_seed_mode: 'm',
            toggle_glider_mode: 'g',
            quit: 'q',
        }
    }
}

pub struct ControlBinder {
    bindings: KeybindingsConfig,
}

impl ControlBinder {
    pub fn new(bindings: KeybindingsConfig) -> Self {
        ControlBinder { bindings }
    }

    /// Resolves a key press to an action, or `None` when the key is
    /// unbound or the action is illegal in `state`.
    pub fn action_for(&self, ch: char, state: RunState) -> Option<ControlAction> {
        let action = self.lookup(ch)?;
        if Self::legal(action, state) {
            Some(action)
        } else {
            debug!("controls: {:?} ignored in {:?}", action, state);
            None
        }
    }

    fn lookup(&self, ch: char) -> Option<ControlAction> {
        let b = &self.bindings;
        let action = match ch {
            c if c == b.start => ControlAction::Start,
            c if c == b.stop => ControlAction::Stop,
            c if c == b.resume => ControlAction::Resume,
            c if c == b.reset => ControlAction::Reset,
            c if c == b.pixel_size_up => ControlAction::PixelSizeUp,
            c if c == b.pixel_size_down => ControlAction::PixelSizeDown,
            c if c == b.cycle_seed_mode => ControlAction::CycleSeedMode,
            c if c == b.toggle_glider_mode => ControlAction::ToggleGliderMode,
            c if c == b.quit => ControlAction::Quit,
            '1' => ControlAction::SelectDirection(GliderDirection::Nw),
            '2' => ControlAction::SelectDirection(GliderDirection::Ne),
            '3' => ControlAction::SelectDirection(GliderDirection::Sw),
            '4' => ControlAction::SelectDirection(GliderDirection::Se),
            _ => return None,
        };
        Some(action)
    }

    fn legal(action: ControlAction, state: RunState) -> bool {
        use ControlAction::*;
        match state {
            RunState::Idle => !matches!(action, Stop | Resume),
            RunState::Running => matches!(action, Stop | Quit),
            RunState::Paused => matches!(action, Resume | Reset | Quit),
        }
    }

    /// Short hint line for the status row, listing the keys that do
    /// something in `state`.
    pub fn hints(&self, state: RunState) -> String {
        let b = &self.bindings;
        match state {
            RunState::Idle => format!(
                "[{}]tart [{}]eset [{}/{}]size [{}]ode [{}]lider [1-4]dir [{}]uit",
                b.start,
                b.reset,
                b.pixel_size_up,
                b.pixel_size_down,
                b.cycle_seed_mode,
                b.toggle_glider_mode,
                b.quit
            ),
            RunState::Running => format!("[{}]ause [{}]uit", b.stop, b.quit),
            RunState::Paused => format!("[{}]esume [{}]eset [{}]uit", b.resume, b.reset, b.quit),
        }
    }
}
