// src/platform/mock.rs

//! A recording `SurfaceDriver` for tests.
//!
//! State lives behind an `Rc<RefCell<..>>` handle so a test can keep
//! queueing events and inspecting executed commands while the driver
//! itself is lent mutably to the app.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::Result;

use super::{BackendEvent, DrawCommand, SurfaceDriver};

pub struct MockState {
    pub size_px: (u32, u32),
    pub queued_events: VecDeque<Vec<BackendEvent>>,
    pub executed: Vec<DrawCommand>,
    pub presents: u32,
    pub cleanups: u32,
}

impl MockState {
    /// Queues one batch of events for the next `process_events` call.
    pub fn queue(&mut self, events: Vec<BackendEvent>) {
        self.queued_events.push_back(events);
    }

    /// Executed fill rectangles, for batch-order checks.
    pub fn fill_rects(&self) -> Vec<DrawCommand> {
        self.executed
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
            .cloned()
            .collect()
    }
}

pub struct MockDriver {
    state: Rc<RefCell<MockState>>,
}

impl MockDriver {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        MockDriver {
            state: Rc::new(RefCell::new(MockState {
                size_px: (width_px, height_px),
                queued_events: VecDeque::new(),
                executed: Vec::new(),
                presents: 0,
                cleanups: 0,
            })),
        }
    }

    /// Shared handle to the recorded state. Held by the test alongside
    /// the driver borrow.
    pub fn handle(&self) -> Rc<RefCell<MockState>> {
        Rc::clone(&self.state)
    }
}

impl SurfaceDriver for MockDriver {
    fn process_events(&mut self) -> Result<Vec<BackendEvent>> {
        Ok(self
            .state
            .borrow_mut()
            .queued_events
            .pop_front()
            .unwrap_or_default())
    }

    fn surface_size_px(&self) -> (u32, u32) {
        self.state.borrow().size_px
    }

    fn execute(&mut self, commands: Vec<DrawCommand>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        for command in commands {
            if command == DrawCommand::Present {
                state.presents += 1;
            }
            state.executed.push(command);
        }
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.state.borrow_mut().cleanups += 1;
        Ok(())
    }
}
