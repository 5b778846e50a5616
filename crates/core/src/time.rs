use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in stores and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }
}

/// Hands out strictly increasing timestamps.
///
/// This is the server-timestamp primitive used by store implementations to
/// resolve `created_at`: two writes never share a timestamp, even under a
/// fixed clock or a coarse system clock.
#[derive(Debug)]
pub struct ServerClock {
    clock: Clock,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl ServerClock {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            last: Mutex::new(None),
        }
    }

    /// Next timestamp, at least one microsecond after the previous one.
    #[must_use]
    pub fn next_timestamp(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let next = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }
}

impl Default for ServerClock {
    fn default() -> Self {
        Self::new(Clock::Default)
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
