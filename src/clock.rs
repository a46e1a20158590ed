use std::fmt;

use time::{Duration, OffsetDateTime};

/// A source of record timestamps.
///
/// Used by [`crate::RotatingWriter::submit_now`]; callers with their own
/// timestamps go through `submit` and never touch the clock.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time via `OffsetDateTime::now_utc`.
///
/// Follows NTP adjustments, so consecutive readings may go backwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A monotonic clock driven by the CPU's Time-Stamp Counter via `quanta`.
///
/// Anchored to wall-clock time once at construction, then advanced by TSC
/// ticks, so readings never go backwards.
#[derive(Clone)]
pub struct TscClock {
    clock: quanta::Clock,
    start_wall: OffsetDateTime,
    start_instant: quanta::Instant,
}

impl Default for TscClock {
    fn default() -> Self {
        let clock = quanta::Clock::new();
        let start_instant = clock.now();
        Self {
            clock,
            start_wall: OffsetDateTime::now_utc(),
            start_instant,
        }
    }
}

impl TscClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for TscClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TscClock")
            .field("start_wall", &self.start_wall)
            .finish()
    }
}

impl Clock for TscClock {
    fn now(&self) -> OffsetDateTime {
        let elapsed = self.clock.now().duration_since(self.start_instant);
        match Duration::try_from(elapsed) {
            Ok(elapsed) => self.start_wall.saturating_add(elapsed),
            Err(_) => OffsetDateTime::now_utc(),
        }
    }
}
