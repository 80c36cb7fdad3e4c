// In src/main.rs

pub mod adapter;
pub mod app;
pub mod color;
pub mod config;
pub mod controls;
pub mod engine;
pub mod instrument;
pub mod params;
pub mod platform;
pub mod pointer;
pub mod render;
pub mod runloop;
pub mod sizer;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use crate::{
    app::ViewportApp,
    config::Config,
    engine::life::LifeUniverse,
    engine::EngineFactory,
    instrument::{FrameSink, NullSink, TickTimer},
    platform::console::ConsoleDriver,
    runloop::IntervalScheduler,
};

const CONFIG_ENV_VAR: &str = "LIFE_VIEW_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "life-view.json";
const TICK_TIMER_WINDOW_FRAMES: u32 = 100;

fn config_path() -> PathBuf {
    if let Some(arg) = std::env::args().nth(1) {
        return PathBuf::from(arg);
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting life-view...");

    let config = Config::load(&config_path()).context("Failed to load configuration")?;

    let factory: EngineFactory = Box::new(|size, mode| Box::new(LifeUniverse::new(size, mode)));

    let sink: Box<dyn FrameSink> = if config.behavior.instrument_frames {
        Box::new(TickTimer::new(TICK_TIMER_WINDOW_FRAMES))
    } else {
        Box::new(NullSink)
    };

    let mut scheduler =
        IntervalScheduler::new(Duration::from_millis(config.behavior.frame_interval_ms));

    let mut driver = ConsoleDriver::new().context("Failed to initialize console driver")?;
    let mut app = ViewportApp::new(&mut driver, &config, factory, sink)
        .context("Failed to initialize viewport app")?;

    app.run(&mut scheduler).context("Viewport app failed")?;

    info!("life-view exited cleanly.");
    Ok(())
}
