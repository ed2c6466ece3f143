//! Time management utilities

use std::time::{Duration, Instant};

/// Frame timer producing the delta between successive ticks
///
/// The first tick always reports a delta of zero so that the time spent
/// loading before the first frame does not show up as a simulation spike.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last_tick: Option<Instant>,
    delta_time: f64,
    total_time: f64,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer that has not ticked yet
    pub fn new() -> Self {
        Self {
            last_tick: None,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the timer and return the seconds elapsed since the previous tick
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Advance the timer using an explicit timestamp
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        self.delta_time = self
            .last_tick
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64());

        self.last_tick = Some(now);
        self.total_time += self.delta_time;
        self.frame_count += 1;

        self.delta_time
    }

    /// Forget the previous tick, the next tick yields zero again
    pub fn reset(&mut self) {
        self.last_tick = None;
        self.delta_time = 0.0;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Get the total elapsed time across all ticks
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (based on last frame time)
    pub fn current_fps(&self) -> f64 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Reset the stopwatch and start it again
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.start();
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_zero() {
        let mut timer = FrameTimer::new();
        let start = Instant::now();

        assert_eq!(timer.tick_at(start), 0.0);

        let delta = timer.tick_at(start + Duration::from_millis(16));
        assert!((delta - 0.016).abs() < 1e-9);
        assert_eq!(timer.frame_count(), 2);
    }

    #[test]
    fn test_reset_restarts_delta() {
        let mut timer = FrameTimer::new();
        let start = Instant::now();

        timer.tick_at(start);
        timer.reset();

        assert_eq!(timer.tick_at(start + Duration::from_secs(5)), 0.0);
    }

    #[test]
    fn test_stopwatch_accumulates() {
        let mut stopwatch = Stopwatch::start_new();
        assert!(stopwatch.is_running());

        stopwatch.stop();
        assert!(!stopwatch.is_running());

        let first = stopwatch.elapsed();
        assert_eq!(stopwatch.elapsed(), first);
    }
}
