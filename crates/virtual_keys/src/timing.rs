use settings::constants::virtual_keys::{
    DEFAULT_REPEAT_DELAY_MS, FALLBACK_LONG_PRESS_MS, MAX_LONG_PRESS_MS, MAX_REPEAT_DELAY_MS,
    MIN_LONG_PRESS_MS, MIN_REPEAT_DELAY_MS,
};
use std::time::Duration;

/// Long-press threshold and repeat interval. Out-of-range values are replaced
/// by the fallback rather than clamped to the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongPressTiming {
    timeout_ms: u64,
    repeat_delay_ms: u64,
}

impl Default for LongPressTiming {
    fn default() -> Self {
        Self {
            timeout_ms: FALLBACK_LONG_PRESS_MS,
            repeat_delay_ms: DEFAULT_REPEAT_DELAY_MS,
        }
    }
}

fn in_range_or(value: u64, min: u64, max: u64, fallback: u64) -> u64 {
    if (min..=max).contains(&value) {
        value
    } else {
        tracing::debug!("{} outside [{}, {}], using {}", value, min, max, fallback);
        fallback
    }
}

impl LongPressTiming {
    pub fn new(timeout_ms: u64, repeat_delay_ms: u64) -> Self {
        let mut timing = Self::default();
        timing.set_timeout_ms(timeout_ms);
        timing.set_repeat_delay_ms(repeat_delay_ms);
        timing
    }

    pub fn set_timeout_ms(&mut self, ms: u64) {
        self.timeout_ms = in_range_or(ms, MIN_LONG_PRESS_MS, MAX_LONG_PRESS_MS, FALLBACK_LONG_PRESS_MS);
    }

    pub fn set_repeat_delay_ms(&mut self, ms: u64) {
        self.repeat_delay_ms =
            in_range_or(ms, MIN_REPEAT_DELAY_MS, MAX_REPEAT_DELAY_MS, DEFAULT_REPEAT_DELAY_MS);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn repeat_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_delay_ms)
    }
}
