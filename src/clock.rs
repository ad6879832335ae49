//! Timezone-aware clock abstraction (spec §6 "Configuration (enumerated):
//! clock (timezone-aware)", §4.5 "SystemElimination").
//!
//! Modeled after the reference crate's pluggable callback fields
//! (`trade_listener`, `price_level_changed_listener`): a capability handed
//! to the engine at construction, never reached into. Tests inject a
//! [`FixedClock`] instead of wall time so day-rollover and expiry
//! scenarios are deterministic.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// A source of "now", expressed both as an absolute instant and as a
/// local calendar date in some configured timezone.
pub trait Clock: Send + Sync {
    /// The current absolute instant.
    fn now(&self) -> DateTime<Utc>;

    /// The timezone this clock reports local dates in.
    fn timezone(&self) -> Tz;

    /// The current local calendar date in [`Clock::timezone`].
    fn local_date(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone()).date_naive()
    }
}

/// A [`Clock`] backed by the system wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    /// Creates a system clock reporting local dates in `timezone`.
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// A [`Clock`] that always reports a fixed instant, for deterministic
/// tests of day-rollover and expiry logic.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
    timezone: Tz,
}

impl FixedClock {
    /// Creates a clock pinned to `instant`, reporting local dates in
    /// `timezone`.
    pub fn new(instant: DateTime<Utc>, timezone: Tz) -> Self {
        Self { instant, timezone }
    }

    /// Advances the pinned instant by a number of seconds. Useful for
    /// stepping a test scenario across a day boundary.
    pub fn advance_seconds(&mut self, seconds: i64) {
        self.instant += chrono::Duration::seconds(seconds);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}
