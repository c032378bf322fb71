use std::f64::consts::TAU;

/// Shortest period the motion model accepts, in seconds.
pub const MIN_PERIOD_SEC: f64 = 0.001;

/// Elapsed time beyond which the accumulator is folded back into one period.
pub const ELAPSED_WRAP_SEC: f64 = 100_000.0;

/// Vertical "breathing" bob: a sine wave of fixed amplitude and period driven
/// by accumulated wall-clock time.
///
/// The offset is a pure function of `elapsed / period`, so the model does not
/// care how often it is updated; only the sum of the deltas matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreathingMotion {
    amplitude_px: f64,
    period_sec: f64,
    elapsed_sec: f64,
}

impl Default for BreathingMotion {
    fn default() -> Self {
        Self::new(2.0, 3.0)
    }
}

impl BreathingMotion {
    pub fn new(amplitude_px: f64, period_sec: f64) -> Self {
        let mut motion = Self {
            amplitude_px: 0.0,
            period_sec: MIN_PERIOD_SEC,
            elapsed_sec: 0.0,
        };
        motion.set_params(amplitude_px, period_sec);
        motion
    }

    /// Stores the amplitude and the period, clamping the period to
    /// [`MIN_PERIOD_SEC`]. Elapsed time is left untouched.
    pub fn set_params(&mut self, amplitude_px: f64, period_sec: f64) {
        self.amplitude_px = amplitude_px;
        // `max` also maps NaN to the floor.
        self.period_sec = period_sec.max(MIN_PERIOD_SEC);
    }

    /// Advances the clock by `delta_sec`. Callers must pass a finite,
    /// non-negative delta.
    pub fn update(&mut self, delta_sec: f64) {
        debug_assert!(
            delta_sec.is_finite() && delta_sec >= 0.0,
            "motion delta must be finite and non-negative, got {delta_sec}"
        );
        self.elapsed_sec += delta_sec;
        if self.elapsed_sec > ELAPSED_WRAP_SEC {
            self.elapsed_sec %= self.period_sec;
        }
    }

    /// Unrounded displacement in pixels.
    pub fn offset_raw(&self) -> f64 {
        let phase = TAU * (self.elapsed_sec / self.period_sec);
        self.amplitude_px * phase.sin()
    }

    /// Displacement rounded half away from zero.
    pub fn offset_px(&self) -> i32 {
        self.offset_raw().round() as i32
    }

    pub fn amplitude_px(&self) -> f64 {
        self.amplitude_px
    }

    pub fn period_sec(&self) -> f64 {
        self.period_sec
    }

    pub fn elapsed_sec(&self) -> f64 {
        self.elapsed_sec
    }
}
