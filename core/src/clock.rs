//! Simulation clock: frame admission, the Logic Frame Counter, pause and quit.
//!
//! The host calls `poll(now)` every time it could run a frame (typically
//! once per display refresh). A frame is admitted only when `now` has
//! reached `next_due`; otherwise nothing runs. Timestamps are offsets
//! from a host-chosen epoch so tests can drive the clock with synthetic
//! time.

use crate::types::LogicFrame;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_FPS: u32 = 30;

/// Result of polling the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Not yet due. Skip update and render.
    NotDue,
    /// Run exactly one frame, then call `complete_frame`.
    Due,
    /// Quit was requested. Returned exactly once; the caller tears down.
    Quit,
    /// Stopped, or never started. Nothing will ever be admitted again
    /// until `start` (which is refused after quitting).
    Halted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    max_fps:               u32,
    target_frame_interval: Duration,
    last_frame_timestamp:  Duration,
    next_due_timestamp:    Duration,
    current_frame:         LogicFrame,
    paused:                bool,
    running:               bool,
    quitting:              bool,
    /// Window focus. Informational only; never blocks admission.
    active:                bool,
}

impl SimClock {
    pub fn new(max_fps: u32) -> Self {
        let max_fps = if max_fps == 0 {
            log::warn!("clock: max fps 0 is invalid; using {DEFAULT_MAX_FPS}");
            DEFAULT_MAX_FPS
        } else {
            max_fps
        };
        let target_frame_interval = interval_for(max_fps);
        Self {
            max_fps,
            target_frame_interval,
            last_frame_timestamp: Duration::ZERO,
            next_due_timestamp: target_frame_interval,
            current_frame: 0,
            paused: false,
            running: false,
            quitting: false,
            active: true,
        }
    }

    /// Begin admitting frames. The first frame is due one interval
    /// after `now`. Refused once quitting.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.quitting {
            log::warn!("clock: start() after quit is ignored");
            return false;
        }
        self.running = true;
        self.rebase(now);
        true
    }

    /// Decide whether a frame may run at `now`.
    pub fn poll(&mut self, now: Duration) -> Admission {
        if self.quitting {
            if self.running {
                self.running = false;
                return Admission::Quit;
            }
            return Admission::Halted;
        }
        if !self.running {
            return Admission::Halted;
        }
        if now < self.next_due_timestamp {
            return Admission::NotDue;
        }
        Admission::Due
    }

    /// Record that the admitted frame finished at `now`. Advances the
    /// Logic Frame Counter unless paused. Returns the counter.
    pub fn complete_frame(&mut self, now: Duration) -> LogicFrame {
        if !self.paused {
            self.current_frame += 1;
        }
        self.rebase(now);
        self.current_frame
    }

    /// Change the frame-rate ceiling. Both timestamps restart from
    /// `now`, so no catch-up carries over. Zero is rejected.
    pub fn set_frame_rate_limit(&mut self, fps: u32, now: Duration) -> bool {
        if fps == 0 {
            log::warn!("clock: frame rate limit 0 rejected; keeping {}", self.max_fps);
            return false;
        }
        self.max_fps = fps;
        self.target_frame_interval = interval_for(fps);
        self.rebase(now);
        log::info!("clock: frame rate limit set to {fps}");
        true
    }

    pub fn frame_rate_limit(&self) -> u32 {
        self.max_fps
    }

    pub fn target_frame_interval(&self) -> Duration {
        self.target_frame_interval
    }

    pub fn last_frame_timestamp(&self) -> Duration {
        self.last_frame_timestamp
    }

    pub fn next_due_timestamp(&self) -> Duration {
        self.next_due_timestamp
    }

    /// How long a host may sleep before the next frame is due.
    pub fn time_until_due(&self, now: Duration) -> Duration {
        self.next_due_timestamp.saturating_sub(now)
    }

    pub fn current_frame(&self) -> LogicFrame {
        self.current_frame
    }

    /// Back to frame 0. Rate, pause, and run state are kept.
    pub fn reset(&mut self) {
        self.current_frame = 0;
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Terminal: once set, no further frames are admitted.
    pub fn request_quit(&mut self) {
        if !self.quitting {
            log::info!("clock: quit requested at frame {}", self.current_frame);
        }
        self.quitting = true;
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn rebase(&mut self, now: Duration) {
        self.last_frame_timestamp = now;
        self.next_due_timestamp = now + self.target_frame_interval;
    }
}

impl Default for SimClock {
    fn default() -> Self { Self::new(DEFAULT_MAX_FPS) }
}

fn interval_for(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps as f64)
}
