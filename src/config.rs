// src/config.rs

//! Configuration structures for the viewport controller.
//!
//! Everything here deserializes from a JSON config file; every field has a
//! default, so a partial file (or no file at all) yields a working
//! configuration. `Serialize` is derived too so the effective config can
//! be exported for inspection.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::controls::KeybindingsConfig;
use crate::engine::SeedMode;

/// Root of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub appearance: AppearanceConfig,
    pub behavior: BehaviorConfig,
    pub keybindings: KeybindingsConfig,
}

/// Visual settings: cell geometry and the three-color palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Side length of a cell's square, in pixels.
    pub pixel_size: u16,
    /// Gap between adjacent cells, in pixels.
    pub border_width: u16,
    /// Fill color for live cells.
    pub alive_color: Rgb,
    /// Fill color for dead cells.
    pub dead_color: Rgb,
    /// Color the surface is cleared to on a full redraw.
    pub background_color: Rgb,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            pixel_size: 1,
            border_width: 1,
            alive_color: Rgb::BLACK,
            dead_color: Rgb::WHITE,
            background_color: Rgb::WHITE,
        }
    }
}

/// Run-loop behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Target delay between simulation frames, in milliseconds.
    pub frame_interval_ms: u64,
    /// Seed mode applied to freshly created grids.
    pub initial_seed_mode: SeedMode,
    /// When set, frame durations are timed and reported to the log.
    pub instrument_frames: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            frame_interval_ms: 33,
            initial_seed_mode: SeedMode::Random,
            instrument_frames: false,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file. A missing file is not an
    /// error; it yields the defaults. A file that exists but fails to
    /// parse is an error, so a typo never silently reverts settings.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            warn!(
                "config file {} not found, using defaults",
                path.display()
            );
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }
}
