//! Injected time.
//!
//! Every time-dependent rule (mission unlock, market hours, timestamps on
//! trades and news) reads the current instant through a [`Clock`], so tests
//! can pin it with a [`FixedClock`].

use std::sync::RwLock;

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Offset of the civil timezone the event runs in (UTC+5:30).
pub const GAME_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The game's civil timezone.
pub fn game_offset() -> FixedOffset {
    // Well inside ±24 h, so the fallback is never taken.
    FixedOffset::east_opt(GAME_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Converts an instant to the game's local time.
pub fn to_game_time(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    now.with_timezone(&game_offset())
}

/// A source of "now".
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        match self.now.write() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
