//! Logic-frame ⇄ real-time conversions.
//!
//! One logic frame is always 1/30 simulated second, no matter how much
//! wall-clock time passed between admitted frames.

use crate::types::LogicFrame;

pub const LOGIC_FRAMES_PER_SECOND: u32 = 30;
pub const MSEC_PER_SECOND: f64 = 1000.0;
pub const MSEC_PER_LOGIC_FRAME: f64 = MSEC_PER_SECOND / LOGIC_FRAMES_PER_SECOND as f64;
pub const SECONDS_PER_LOGIC_FRAME: f64 = 1.0 / LOGIC_FRAMES_PER_SECOND as f64;

pub fn frames_to_seconds(frames: LogicFrame) -> f64 {
    frames as f64 * SECONDS_PER_LOGIC_FRAME
}

/// Whole frames covering `seconds`, rounded up so short durations last
/// at least one frame.
pub fn seconds_to_frames(seconds: f64) -> LogicFrame {
    if seconds <= 0.0 {
        return 0;
    }
    (seconds * LOGIC_FRAMES_PER_SECOND as f64).ceil() as LogicFrame
}

pub fn msecs_to_frames(msecs: f64) -> f64 {
    msecs * (LOGIC_FRAMES_PER_SECOND as f64 / MSEC_PER_SECOND)
}

/// Distance per second → distance per frame.
pub fn velocity_per_second_to_per_frame(dist_per_sec: f64) -> f64 {
    dist_per_sec * SECONDS_PER_LOGIC_FRAME
}

/// Distance per second² → distance per frame².
pub fn acceleration_per_second_to_per_frame(dist_per_sec2: f64) -> f64 {
    dist_per_sec2 * SECONDS_PER_LOGIC_FRAME * SECONDS_PER_LOGIC_FRAME
}

pub fn degrees_per_second_to_radians_per_frame(deg_per_sec: f64) -> f64 {
    deg_per_sec.to_radians() * SECONDS_PER_LOGIC_FRAME
}
