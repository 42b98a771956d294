use std::time::Duration;

/// Bounds of the wait between empty polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub floor: Duration,
    pub ceiling: Duration,
    pub multiplier: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            floor: Duration::from_millis(100),
            ceiling: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl PollSettings {
    pub fn new(floor: Duration, ceiling: Duration, multiplier: u32) -> Self {
        Self {
            floor,
            ceiling: ceiling.max(floor),
            multiplier: multiplier.max(1),
        }
    }
}

/// Geometric backoff: after k consecutive empty polls the wait is
/// `min(floor * multiplier^(k-1), ceiling)`.
#[derive(Debug, Clone)]
pub struct Backoff {
    settings: PollSettings,
    current: Duration,
}

impl Backoff {
    pub fn new(settings: PollSettings) -> Self {
        let settings = PollSettings::new(settings.floor, settings.ceiling, settings.multiplier);
        Self {
            current: settings.floor,
            settings,
        }
    }

    /// The wait the next empty poll will use.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Returns the wait for this empty poll and grows the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self
            .current
            .saturating_mul(self.settings.multiplier)
            .min(self.settings.ceiling);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.settings.floor;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(PollSettings::default())
    }
}
