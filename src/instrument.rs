// src/instrument.rs

//! Optional per-frame timing.
//!
//! The app brackets every simulation frame with `begin_frame`/`end_frame`
//! on a sink. The default sink discards the bracketing; the tick timer
//! averages frame durations over a window and reports them to the log.

use std::time::{Duration, Instant};

use log::debug;

pub trait FrameSink {
    fn begin_frame(&mut self);
    fn end_frame(&mut self);
}

/// Sink used when instrumentation is off.
#[derive(Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn begin_frame(&mut self) {}
    fn end_frame(&mut self) {}
}

/// Averages frame durations over a fixed window of frames and logs the
/// result each time the window fills.
pub struct TickTimer {
    window: u32,
    frames: u32,
    accumulated: Duration,
    started: Option<Instant>,
}

impl TickTimer {
    pub fn new(window: u32) -> Self {
        TickTimer {
            window: window.max(1),
            frames: 0,
            accumulated: Duration::ZERO,
            started: None,
        }
    }
}

impl FrameSink for TickTimer {
    fn begin_frame(&mut self) {
        self.started = Some(Instant::now());
    }

    fn end_frame(&mut self) {
        let Some(started) = self.started.take() else {
            return;
        };
        self.accumulated += started.elapsed();
        self.frames += 1;
        if self.frames >= self.window {
            let avg = self.accumulated / self.frames;
            debug!(
                "tick timing: {:.3} ms per frame over {} frames",
                avg.as_secs_f64() * 1000.0,
                self.frames
            );
            self.frames = 0;
            self.accumulated = Duration::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn unmatched_end_frame_is_harmless() {
        let mut timer = TickTimer::new(10);
        timer.end_frame();
        assert_eq!(timer.frames, 0);
    }

    #[test]
    fn window_resets_after_reporting() {
        let mut timer = TickTimer::new(2);
        for _ in 0..2 {
            timer.begin_frame();
            timer.end_frame();
        }
        assert_eq!(timer.frames, 0);
        assert_eq!(timer.accumulated, Duration::ZERO);
    }
}
