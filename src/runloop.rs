// src/runloop.rs

//! Run-state machine for the simulation loop.
//!
//! The controller owns a three-state machine (idle, running, paused) and
//! at most one pending frame request at a time. Frame requests come from a
//! [`FrameScheduler`], which the host loop polls; the controller holds the
//! single outstanding token and guarantees it is cancelled on every
//! transition out of the running state. A frame that fires while running
//! does not reschedule itself until the controller is told the frame's
//! work finished, so a slow frame never stacks requests behind itself.

use log::{debug, warn};

/// Where the simulation loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Never started, or reset. Grid edits and reconfiguration are open.
    #[default]
    Idle,
    /// Frames are being scheduled and stepped.
    Running,
    /// Stopped mid-run; the grid is frozen at the current generation.
    Paused,
}

/// Opaque handle to one scheduled frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken(pub u64);

/// Source of frame timing. The console host uses a wall-clock interval
/// implementation; tests drive the machine with a manual one.
pub trait FrameScheduler {
    /// Requests one future frame and returns its handle.
    fn schedule(&mut self) -> FrameToken;
    /// Revokes a request. Revoking an already-fired token is harmless.
    fn cancel(&mut self, token: FrameToken);
    /// Whether the request has come due.
    fn due(&self, token: FrameToken) -> bool;
}

pub struct RunLoopController {
    state: RunState,
    pending: Option<FrameToken>,
}

impl RunLoopController {
    pub fn new() -> Self {
        RunLoopController {
            state: RunState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Idle -> Running. Schedules the first frame. Ignored elsewhere.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.state != RunState::Idle {
            warn!("run loop: start ignored in {:?}", self.state);
            return false;
        }
        self.state = RunState::Running;
        self.pending = Some(scheduler.schedule());
        debug!("run loop: started");
        true
    }

    /// Running -> Paused. Cancels the pending frame so no step lands after
    /// the pause. Ignored elsewhere.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.state != RunState::Running {
            warn!("run loop: stop ignored in {:?}", self.state);
            return false;
        }
        if let Some(token) = self.pending.take() {
            scheduler.cancel(token);
        }
        self.state = RunState::Paused;
        debug!("run loop: paused");
        true
    }

    /// Paused -> Running. Schedules the next frame. Ignored elsewhere.
    pub fn resume(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.state != RunState::Paused {
            warn!("run loop: resume ignored in {:?}", self.state);
            return false;
        }
        self.state = RunState::Running;
        self.pending = Some(scheduler.schedule());
        debug!("run loop: resumed");
        true
    }

    /// Paused or Idle -> Idle. From Idle this is a no-op that still
    /// reports success, so a reset key always leaves the machine idle.
    /// Ignored while running.
    pub fn reset(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        match self.state {
            RunState::Running => {
                warn!("run loop: reset ignored while running");
                false
            }
            RunState::Idle | RunState::Paused => {
                if let Some(token) = self.pending.take() {
                    scheduler.cancel(token);
                }
                self.state = RunState::Idle;
                debug!("run loop: reset to idle");
                true
            }
        }
    }

    /// Consumes the pending frame if it has come due. The caller steps the
    /// engine, renders, then calls [`Self::frame_complete`].
    pub fn frame_due(&mut self, scheduler: &dyn FrameScheduler) -> bool {
        match self.pending {
            Some(token) if scheduler.due(token) => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Schedules the next frame, but only if the machine is still running.
    /// A stop issued between the frame firing and its work completing
    /// leaves nothing scheduled.
    pub fn frame_complete(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.state == RunState::Running && self.pending.is_none() {
            self.pending = Some(scheduler.schedule());
        }
    }
}

impl Default for RunLoopController {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock scheduler for the console host: one frame per interval,
/// measured from the moment the frame was requested.
pub struct IntervalScheduler {
    interval: std::time::Duration,
    next_token: u64,
    deadline: Option<(FrameToken, std::time::Instant)>,
}

impl IntervalScheduler {
    pub fn new(interval: std::time::Duration) -> Self {
        IntervalScheduler {
            interval,
            next_token: 0,
            deadline: None,
        }
    }
}

impl FrameScheduler for IntervalScheduler {
    fn schedule(&mut self) -> FrameToken {
        self.next_token += 1;
        let token = FrameToken(self.next_token);
        self.deadline = Some((token, std::time::Instant::now() + self.interval));
        token
    }

    fn cancel(&mut self, token: FrameToken) {
        if matches!(self.deadline, Some((pending, _)) if pending == token) {
            self.deadline = None;
        }
    }

    fn due(&self, token: FrameToken) -> bool {
        matches!(
            self.deadline,
            Some((pending, at)) if pending == token && std::time::Instant::now() >= at
        )
    }
}
