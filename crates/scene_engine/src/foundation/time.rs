//! Time management utilities
//!
//! [`Timer`] measures wall-clock frame time; [`GameTime`] is the scaled,
//! clamped frame clock a [`World`](crate::ecs::World) hands to its hooks.

use std::time::Instant;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    #[must_use]
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    #[must_use]
    pub const fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Frame clock of a world
///
/// `delta_time` is the raw frame time clamped to `max_delta_time` and then
/// multiplied by `time_scale`. The unscaled values ignore the scale but keep
/// the clamp.
#[derive(Debug, Clone)]
pub struct GameTime {
    time_scale: f32,
    max_delta_time: f32,
    unscaled_delta_time: f32,
    delta_time: f32,
    elapsed: f32,
    unscaled_elapsed: f32,
    frame_count: u64,
}

impl Default for GameTime {
    fn default() -> Self {
        Self::new(1.0, 0.25)
    }
}

impl GameTime {
    /// Create a clock with the given scale and per-frame clamp
    #[must_use]
    pub fn new(time_scale: f32, max_delta_time: f32) -> Self {
        Self {
            time_scale: time_scale.max(0.0),
            max_delta_time: max_delta_time.max(0.0),
            unscaled_delta_time: 0.0,
            delta_time: 0.0,
            elapsed: 0.0,
            unscaled_elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Advance by one frame of `raw_delta` seconds
    pub fn advance(&mut self, raw_delta: f32) {
        let clamped = if raw_delta.is_finite() {
            raw_delta.clamp(0.0, self.max_delta_time)
        } else {
            0.0
        };
        self.unscaled_delta_time = clamped;
        self.delta_time = clamped * self.time_scale;
        self.unscaled_elapsed += clamped;
        self.elapsed += self.delta_time;
        self.frame_count += 1;
    }

    /// Scaled time since the previous frame
    #[must_use]
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Time since the previous frame, ignoring the time scale
    #[must_use]
    pub const fn unscaled_delta_time(&self) -> f32 {
        self.unscaled_delta_time
    }

    /// Scaled time since the world started
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Unscaled time since the world started
    #[must_use]
    pub const fn unscaled_elapsed(&self) -> f32 {
        self.unscaled_elapsed
    }

    /// Number of frames advanced so far
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Current time scale
    #[must_use]
    pub const fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the time scale; negative values clamp to zero
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale.max(0.0);
    }
}
