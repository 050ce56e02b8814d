//! Frame timing
//!
//! The host calls [`FrameClock::tick`] from its animation callback with a
//! timestamp and whether the plot is on screen. While hidden or paused no
//! time passes, and the first frame back gets a small fixed step instead
//! of the whole gap.

/// Step used for the first frame after a (re)start, seconds
pub const DEFAULT_FIRST_DT: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    last: Option<f64>,
    paused: bool,
    first_dt: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_first_dt(DEFAULT_FIRST_DT)
    }

    pub fn with_first_dt(first_dt: f64) -> Self {
        Self {
            last: None,
            paused: false,
            first_dt,
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if paused {
            self.last = None;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Time since the previous tick, or `None` when no step should run.
    pub fn tick(&mut self, now: f64, visible: bool) -> Option<f64> {
        if self.paused || !visible {
            self.last = None;
            return None;
        }
        let dt = match self.last {
            // Clocks can go backwards across tab switches
            Some(last) if now > last => now - last,
            Some(_) => 0.0,
            None => self.first_dt,
        };
        self.last = Some(now);
        Some(dt)
    }
}
