use chrono::{DateTime, Local, NaiveDateTime};
use std::time::SystemTime;

/// Wall-clock source for log record timestamps, injectable for tests.
pub trait Clock {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Convert a clock reading to the naive local time written into the log.
pub fn to_local_naive(instant: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(instant).naive_local()
}

#[cfg(test)]
pub struct FixedClock(pub SystemTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// Pin the process zone for tests that compare wall-clock values computed
/// at different moments. Every caller sets this one value, so concurrently
/// running tests can never observe a zone flip.
#[cfg(test)]
pub fn pin_zone() {
    // SAFETY: TZ is only ever written with this single value.
    unsafe { std::env::set_var("TZ", "Europe/Helsinki") };
}
