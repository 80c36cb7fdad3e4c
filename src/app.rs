// src/app.rs

//! The viewport coordinator.
//!
//! `ViewportApp` wires every layer together: driver events feed the
//! control binder and the pointer editor, parameter writes raise dirty
//! flags through subscriptions, and each pump drains those flags in a
//! fixed order (layout, then grid rebuild, then reseed, then redraw and
//! status). The flags keep parameter callbacks trivial; all engine and
//! driver work happens in the pump, outside any notification, so a
//! cascade can never re-enter a parameter cell.

use std::cell::Cell as StdCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::adapter::EngineAdapter;
use crate::config::Config;
use crate::controls::{ControlAction, ControlBinder};
use crate::engine::EngineFactory;
use crate::instrument::FrameSink;
use crate::params::{ParameterStore, Subscription};
use crate::platform::{BackendEvent, DrawCommand, KeySymbol, SurfaceDriver};
use crate::pointer::{PointerEdit, PointerEditor};
use crate::render::{DirtyRegionRenderer, Palette};
use crate::runloop::{FrameScheduler, RunLoopController};
use crate::sizer::ViewportSizer;

/// Largest cell edge the size-up key will grow to.
const MAX_PIXEL_SIZE: u16 = 64;

/// Outcome of one pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Running,
    Shutdown,
}

pub struct ViewportApp<'a> {
    driver: &'a mut dyn SurfaceDriver,
    params: ParameterStore,
    sizer: ViewportSizer,
    adapter: EngineAdapter,
    renderer: DirtyRegionRenderer,
    editor: PointerEditor,
    runloop: RunLoopController,
    binder: ControlBinder,
    sink: Box<dyn FrameSink>,

    // Dirty flags raised by parameter subscriptions and drained in pump.
    layout_dirty: Rc<StdCell<bool>>,
    grid_dirty: Rc<StdCell<bool>>,
    seed_dirty: Rc<StdCell<bool>>,
    status_dirty: Rc<StdCell<bool>>,
    full_redraw: bool,

    subscriptions: Vec<Subscription>,
}

impl<'a> ViewportApp<'a> {
    pub fn new(
        driver: &'a mut dyn SurfaceDriver,
        config: &Config,
        factory: EngineFactory,
        sink: Box<dyn FrameSink>,
    ) -> Result<Self> {
        let border = config.appearance.border_width;
        let params = ParameterStore::new(
            config.appearance.pixel_size,
            config.behavior.initial_seed_mode,
        );
        let sizer = ViewportSizer::new(border);

        let (width_px, height_px) = driver.surface_size_px();
        let dims = sizer.grid_dimensions(width_px, height_px, params.pixel_size.get());
        params.dimensions.set(dims);
        info!(
            "app: initial grid {}x{} from {}x{} px surface",
            dims.rows, dims.cols, width_px, height_px
        );

        let adapter = EngineAdapter::new(
            factory,
            dims,
            params.seed_mode.get(),
            params.generations.clone(),
        );

        let renderer = DirtyRegionRenderer::new(
            Palette {
                alive: config.appearance.alive_color,
                dead: config.appearance.dead_color,
                background: config.appearance.background_color,
            },
            border,
        );
        let editor = PointerEditor::new(
            border,
            params.glider_mode.clone(),
            params.glider_direction.clone(),
        );

        let layout_dirty = Rc::new(StdCell::new(false));
        let grid_dirty = Rc::new(StdCell::new(false));
        let seed_dirty = Rc::new(StdCell::new(false));
        let status_dirty = Rc::new(StdCell::new(false));

        let mut subscriptions = Vec::new();
        let flag = Rc::clone(&layout_dirty);
        subscriptions.push(params.pixel_size.subscribe(move |_| flag.set(true)));
        let flag = Rc::clone(&grid_dirty);
        subscriptions.push(params.dimensions.subscribe(move |_| flag.set(true)));
        let flag = Rc::clone(&seed_dirty);
        subscriptions.push(params.seed_mode.subscribe(move |_| flag.set(true)));
        let flag = Rc::clone(&status_dirty);
        subscriptions.push(params.generations.subscribe(move |_| flag.set(true)));
        let flag = Rc::clone(&status_dirty);
        subscriptions.push(params.glider_mode.subscribe(move |_| flag.set(true)));
        let flag = Rc::clone(&status_dirty);
        subscriptions.push(params.glider_direction.subscribe(move |_| flag.set(true)));

        // Replay-of-one raised every flag during registration; the engine
        // was just built at the current parameters, so only the first full
        // redraw remains to be done.
        layout_dirty.set(false);
        grid_dirty.set(false);
        seed_dirty.set(false);

        Ok(ViewportApp {
            driver,
            params,
            sizer,
            adapter,
            renderer,
            editor,
            runloop: RunLoopController::new(),
            binder: ControlBinder::new(config.keybindings.clone()),
            sink,
            layout_dirty,
            grid_dirty,
            seed_dirty,
            status_dirty,
            full_redraw: true,
            subscriptions,
        })
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn runloop(&self) -> &RunLoopController {
        &self.runloop
    }

    /// One iteration of the controller: drain driver events, settle
    /// parameter cascades, fire a due frame, refresh the status line.
    pub fn pump(&mut self, scheduler: &mut dyn FrameScheduler) -> Result<AppStatus> {
        let events = self
            .driver
            .process_events()
            .context("app: driver event processing failed")?;
        for event in events {
            if self.handle_event(event, scheduler)? == AppStatus::Shutdown {
                return Ok(AppStatus::Shutdown);
            }
        }

        self.settle_cascades()?;

        if self.runloop.frame_due(scheduler) {
            self.fire_frame()?;
            self.runloop.frame_complete(scheduler);
        }

        if self.status_dirty.replace(false) {
            let text = self.status_text();
            self.driver
                .execute(vec![DrawCommand::StatusText { text }, DrawCommand::Present])
                .context("app: status line update failed")?;
        }

        Ok(AppStatus::Running)
    }

    /// Host loop for the interactive binary: pumps until shutdown,
    /// sleeping briefly between iterations to avoid spinning.
    pub fn run(&mut self, scheduler: &mut dyn FrameScheduler) -> Result<()> {
        // Status line changes run-state hints, so force the first draw.
        self.status_dirty.set(true);
        loop {
            if self.pump(scheduler)? == AppStatus::Shutdown {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        info!("app: shutting down");
        for sub in &self.subscriptions {
            sub.cancel();
        }
        self.driver.cleanup().context("app: driver cleanup failed")
    }

    fn handle_event(
        &mut self,
        event: BackendEvent,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<AppStatus> {
        match event {
            BackendEvent::CloseRequested => {
                info!("app: close requested by host");
                return Ok(AppStatus::Shutdown);
            }
            BackendEvent::Resize {
                width_px,
                height_px,
            } => {
                debug!("app: surface resized to {}x{} px", width_px, height_px);
                self.layout_dirty.set(true);
            }
            BackendEvent::Key {
                symbol: KeySymbol::Char(ch),
                ..
            } => {
                if let Some(action) = self.binder.action_for(ch, self.runloop.state()) {
                    return self.apply_action(action, scheduler);
                }
            }
            BackendEvent::Key { .. } => {}
            BackendEvent::PointerPress { x_px, y_px, .. } => {
                let pixel_size = self.params.pixel_size.get();
                let edit = self
                    .editor
                    .handle_click(x_px, y_px, pixel_size, &mut self.adapter);
                if let Some(edit) = edit {
                    let commands = match edit {
                        PointerEdit::Cell(addr, state) => {
                            self.renderer.single_cell(addr, state, pixel_size)
                        }
                        PointerEdit::Stamp(stamp) => {
                            self.renderer
                                .stamp(&stamp, self.adapter.dimensions(), pixel_size)
                        }
                    };
                    self.driver
                        .execute(commands)
                        .context("app: pointer edit redraw failed")?;
                }
            }
        }
        Ok(AppStatus::Running)
    }

    fn apply_action(
        &mut self,
        action: ControlAction,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<AppStatus> {
        debug!("app: applying {:?}", action);
        match action {
            ControlAction::Start => {
                self.runloop.start(scheduler);
            }
            ControlAction::Stop => {
                self.runloop.stop(scheduler);
            }
            ControlAction::Resume => {
                self.runloop.resume(scheduler);
            }
            ControlAction::Reset => {
                if self.runloop.reset(scheduler) {
                    // Fresh grid at the current parameters.
                    self.seed_dirty.set(true);
                }
            }
            ControlAction::PixelSizeUp => {
                let px = self.params.pixel_size.get();
                self.params.pixel_size.set(px.saturating_add(1).min(MAX_PIXEL_SIZE));
            }
            ControlAction::PixelSizeDown => {
                let px = self.params.pixel_size.get();
                self.params.pixel_size.set(px.saturating_sub(1).max(1));
            }
            ControlAction::CycleSeedMode => {
                let mode = self.params.seed_mode.get();
                self.params.seed_mode.set(mode.next());
            }
            ControlAction::ToggleGliderMode => {
                let on = self.params.glider_mode.get();
                self.params.glider_mode.set(!on);
            }
            ControlAction::SelectDirection(dir) => {
                self.params.glider_direction.set(dir);
            }
            ControlAction::Quit => {
                info!("app: quit requested");
                return Ok(AppStatus::Shutdown);
            }
        }
        self.status_dirty.set(true);
        Ok(AppStatus::Running)
    }

    /// Drains the parameter dirty flags in dependency order. Layout first
    /// so a pixel-size change can raise the grid flag within the same
    /// settle; a grid rebuild subsumes a pending reseed since the new
    /// engine is seeded on creation.
    fn settle_cascades(&mut self) -> Result<()> {
        if self.layout_dirty.replace(false) {
            let (width_px, height_px) = self.driver.surface_size_px();
            self.sizer.apply(
                width_px,
                height_px,
                self.params.pixel_size.get(),
                &self.params.dimensions,
            );
            // Geometry changed even when the cell count did not.
            self.full_redraw = true;
        }
        if self.grid_dirty.replace(false) {
            self.adapter
                .rebuild(self.params.dimensions.get(), self.params.seed_mode.get());
            self.seed_dirty.set(false);
            self.full_redraw = true;
        }
        if self.seed_dirty.replace(false) {
            self.adapter.reseed(self.params.seed_mode.get());
            self.full_redraw = true;
        }
        if self.full_redraw {
            self.full_redraw = false;
            let commands = self.renderer.full(
                self.adapter.changes(),
                self.adapter.dimensions(),
                self.params.pixel_size.get(),
            );
            self.driver
                .execute(commands)
                .context("app: full redraw failed")?;
            self.status_dirty.set(true);
        }
        Ok(())
    }

    fn fire_frame(&mut self) -> Result<()> {
        self.sink.begin_frame();
        let pixel_size = self.params.pixel_size.get();
        let size = self.adapter.dimensions();
        let commands = {
            let deltas = self.adapter.step();
            self.renderer.changed_cells(deltas, size, pixel_size)
        };
        self.driver
            .execute(commands)
            .context("app: frame redraw failed")?;
        self.sink.end_frame();
        Ok(())
    }

    fn status_text(&self) -> String {
        let dims = self.params.dimensions.get();
        let edit_mode = if self.params.glider_mode.get() {
            format!("glider {}", self.params.glider_direction.get().label())
        } else {
            "draw".to_string()
        };
        format!(
            "gen {:>6} | {}x{} | seed {} | {} | {}",
            self.params.generations.get(),
            dims.rows,
            dims.cols,
            self.params.seed_mode.get().label(),
            edit_mode,
            self.binder.hints(self.runloop.state()),
        )
    }
}
