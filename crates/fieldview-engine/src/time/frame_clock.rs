use std::time::{Duration, Instant};

/// Timing of one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Seconds since the clock was created or reset, unclamped.
    pub elapsed: f32,

    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots.
///
/// Delta time is clamped so a stalled loop (debugger, minimized window)
/// does not make animations jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts elapsed time and the delta baseline.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last = now;
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_ticks_are_clamped_to_minimum() {
        let mut clock = FrameClock::with_clamps(Duration::from_secs(1), Duration::from_secs(2));
        assert_eq!(clock.tick().dt, 1.0);
        assert_eq!(clock.tick().dt, 1.0);
    }

    #[test]
    fn frame_index_and_elapsed_advance() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
        assert!(b.elapsed >= a.elapsed);
    }

    #[test]
    fn reset_restarts_elapsed() {
        let mut clock = FrameClock::new();
        std::thread::sleep(Duration::from_millis(5));
        clock.reset();
        assert!(clock.tick().elapsed < 0.005);
    }
}
