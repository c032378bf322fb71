use std::time::{Duration, Instant};

/// Abstraction over where tick timestamps originate from.
pub trait TimeSource: Send {
    /// Time elapsed since the source's own origin.
    fn now(&mut self) -> Duration;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Creates a system time source initialised to `Instant::now()`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Time source that only moves when told to. Useful for deterministic
/// playback and for driving the tick loop without a real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTimeSource {
    now: Duration,
}

impl ManualTimeSource {
    pub fn new(start: Duration) -> Self {
        Self { now: start }
    }

    pub fn advance(&mut self, delta: Duration) {
        self.now += delta;
    }

    /// Jumps to an arbitrary timestamp, including one in the past.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&mut self) -> Duration {
        self.now
    }
}

/// Seconds between two samples, clamped to zero if the clock went backwards.
pub fn delta_seconds(previous: Duration, now: Duration) -> f64 {
    now.checked_sub(previous)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}
