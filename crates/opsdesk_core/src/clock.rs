//! Time source used by stores and seed generation.
//!
//! # Responsibility
//! - Provide the "current time" to every component that stamps records.
//! - Keep timestamps at millisecond precision so a stamped value survives a
//!   JSON round trip unchanged.
//!
//! # Invariants
//! - `Clock::now()` never returns sub-millisecond precision.
//! - `later_than(now, floor)` is strictly greater than `floor`.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::sync::Mutex;

/// Timestamp type shared by every record.
pub type Timestamp = DateTime<Utc>;

/// Source of the current time.
///
/// Injected into stores and repositories so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().trunc_subsecs(3)
    }
}

/// Clock pinned to a caller-controlled instant.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(instant: Timestamp) -> Self {
        Self {
            instant: Mutex::new(instant.trunc_subsecs(3)),
        }
    }

    /// Moves the pinned instant forward.
    pub fn advance(&self, by: Duration) {
        let mut guard = self
            .instant
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = (*guard + by).trunc_subsecs(3);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self
            .instant
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Returns `now`, or one millisecond past `floor` when the clock has not moved
/// beyond it.
pub fn later_than(now: Timestamp, floor: Timestamp) -> Timestamp {
    if now > floor {
        now
    } else {
        floor + Duration::milliseconds(1)
    }
}
