use std::time::{Duration, Instant};

/// Nominal frame length: 60 frames per second.
pub const DEFAULT_FRAME: Duration = Duration::from_micros(16_667);

/// Source of animation frames for suspended commands.
///
/// Each call waits for (or simulates) one frame and reports how much time
/// it covered.
pub trait FrameClock {
    /// Advance one frame and return the elapsed time.
    fn next_frame(&mut self) -> Duration;
}

/// A clock that never sleeps and reports the same step every frame.
///
/// Deterministic; used headless and in tests.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    frames: u64,
}

impl FixedStep {
    /// A clock advancing by `step` per frame.
    pub fn new(step: Duration) -> Self {
        Self { step, frames: 0 }
    }

    /// Frames handed out so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME)
    }
}

impl FrameClock for FixedStep {
    fn next_frame(&mut self) -> Duration {
        self.frames += 1;
        self.step
    }
}

/// A wall-clock driven frame source that sleeps to a frame budget.
#[derive(Debug)]
pub struct RealTimeClock {
    budget: Duration,
    last: Instant,
}

impl RealTimeClock {
    /// A clock targeting one frame per `budget`.
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            last: Instant::now(),
        }
    }
}

impl Default for RealTimeClock {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME)
    }
}

impl FrameClock for RealTimeClock {
    fn next_frame(&mut self) -> Duration {
        let target = self.last + self.budget;
        let now = Instant::now();
        if target > now {
            std::thread::sleep(target - now);
        }
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_step_counts_frames() {
        let mut clock = FixedStep::new(Duration::from_millis(10));
        assert_eq!(clock.next_frame(), Duration::from_millis(10));
        assert_eq!(clock.next_frame(), Duration::from_millis(10));
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn real_time_clock_waits_at_least_budget() {
        let mut clock = RealTimeClock::new(Duration::from_millis(2));
        let elapsed = clock.next_frame();
        assert!(elapsed >= Duration::from_millis(2));
    }
}
