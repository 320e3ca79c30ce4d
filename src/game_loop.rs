/// Fixed timestep scheduling over host-supplied timestamps.
///
/// The host hands the loop a monotonically non-decreasing timestamp (in
/// milliseconds) once per frame; the loop converts the variable wall-clock
/// deltas into zero or more fixed-size simulation steps, keeping simulation
/// time decoupled from rendering time. Catch-up work is capped per tick and
/// a runaway backlog is dropped outright (spiral-of-death mitigation).
use log::{info, warn};

/// Default update rate (60 fixed updates per second)
pub const DEFAULT_FPS: f64 = 60.0;

/// Maximum catch-up credit per tick, in whole steps. A long stall grants
/// at most this many pending fixed updates instead of one per missed frame.
const MAX_CATCH_UP_STEPS: f64 = 3.0;

/// Consecutive ticks of growing step counts tolerated before the pending
/// backlog is dropped.
const SPIRAL_THRESHOLD: u32 = 1;

/// Game loop timing state
pub struct GameLoop {
    /// Timestamp of the previous tick; `None` until the first tick
    last_timestamp: Option<f64>,
    /// Accumulated unsimulated time, in milliseconds
    accumulated: f64,
    /// Fixed step size in milliseconds, recomputed each tick from
    /// `desired_fps`
    step_size: f64,
    /// Step size after applying `time_scale`; what fixed updates receive
    scaled_step_size: f64,
    /// Fixed updates run on the current tick
    iteration_count: u32,
    /// Fixed updates run on the previous tick
    previous_iteration_count: u32,
    /// Consecutive ticks with a growing iteration count
    spiral_count: u32,
    desired_fps: f64,
    time_scale: f64,
    /// Total ticks received
    tick_count: u64,
    /// Total fixed updates executed
    update_count: u64,
}

impl GameLoop {
    /// Create a loop running fixed updates at [`DEFAULT_FPS`]
    pub fn new() -> Self {
        Self::with_fps(DEFAULT_FPS)
    }

    /// Create a loop running fixed updates at `desired_fps`
    pub fn with_fps(desired_fps: f64) -> Self {
        debug_assert!(desired_fps > 0.0, "desired_fps must be positive");
        let step_size = 1000.0 / desired_fps;
        Self {
            last_timestamp: None,
            accumulated: 0.0,
            step_size,
            scaled_step_size: step_size,
            iteration_count: 0,
            previous_iteration_count: 0,
            spiral_count: 0,
            desired_fps,
            time_scale: 1.0,
            tick_count: 0,
            update_count: 0,
        }
    }

    /// Process one host tick.
    ///
    /// `fixed_update` is invoked once per drained step with
    /// `(scaled_step_ms, scaled_step_secs)`; `variable_update` is invoked
    /// exactly once per tick with `(real_delta_ms, real_delta_secs)`,
    /// regardless of how many fixed steps ran. The first tick establishes
    /// the timestamp baseline and sees a zero delta.
    pub fn run<F, V>(&mut self, timestamp_ms: f64, mut fixed_update: F, variable_update: V)
    where
        F: FnMut(f64, f64),
        V: FnOnce(f64, f64),
    {
        let real_delta = match self.last_timestamp {
            Some(last) => timestamp_ms - last,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);
        self.tick_count += 1;

        if self.spiral_count > SPIRAL_THRESHOLD {
            // Stalled: drop the backlog instead of simulating through it
            warn!(
                "fixed-step backlog grew for {} consecutive ticks, dropping {:.1}ms of pending simulation",
                self.spiral_count, self.accumulated
            );
            self.accumulated = 0.0;
            self.spiral_count = 0;
        } else {
            self.step_size = 1000.0 / self.desired_fps;
            self.scaled_step_size = self.step_size * self.time_scale;
            // At most MAX_CATCH_UP_STEPS frames of credit per tick; a long
            // pause must not replay itself step by step
            self.accumulated += real_delta.clamp(0.0, self.step_size * MAX_CATCH_UP_STEPS);

            self.iteration_count = 0;
            while self.accumulated >= self.step_size {
                self.accumulated -= self.step_size;
                fixed_update(self.scaled_step_size, self.scaled_step_size / 1000.0);
                self.iteration_count += 1;
            }
            self.update_count += u64::from(self.iteration_count);

            if self.iteration_count > self.previous_iteration_count {
                self.spiral_count += 1;
            } else if self.iteration_count < self.previous_iteration_count {
                self.spiral_count = 0;
            }
            self.previous_iteration_count = self.iteration_count;
        }

        variable_update(real_delta, real_delta / 1000.0);
    }

    /// Forget accumulated time and the timestamp baseline.
    ///
    /// Call when the host scene reactivates after a freeze, so stale
    /// catch-up credit from before the freeze cannot burst through a batch
    /// of fixed updates against the reactivated world.
    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.accumulated = 0.0;
        self.iteration_count = 0;
        self.previous_iteration_count = 0;
        self.spiral_count = 0;
        info!("game loop reset");
    }

    /// Target fixed update rate
    pub fn desired_fps(&self) -> f64 {
        self.desired_fps
    }

    /// Change the target fixed update rate; takes effect on the next tick
    pub fn set_desired_fps(&mut self, desired_fps: f64) {
        debug_assert!(desired_fps > 0.0, "desired_fps must be positive");
        self.desired_fps = desired_fps;
    }

    /// Global simulation speed multiplier
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Set the global simulation speed multiplier (1.0 = real time)
    pub fn set_time_scale(&mut self, time_scale: f64) {
        self.time_scale = time_scale;
    }

    /// Current fixed step size in milliseconds
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Unsimulated time carried to the next tick, in milliseconds
    pub fn pending_time(&self) -> f64 {
        self.accumulated
    }

    /// Interpolation factor in `[0, 1)` for rendering between fixed steps
    pub fn alpha(&self) -> f64 {
        self.accumulated / self.step_size
    }

    /// Total ticks received
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Total fixed updates executed
    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
