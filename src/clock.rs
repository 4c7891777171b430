//! The source of "now" for the ledger.
//!
//! Recurring transactions are materialized relative to the current date, so the
//! clock is injected rather than read inline. This keeps the engine
//! deterministic under test.

use time::{Date, OffsetDateTime, macros::time};

use crate::{Error, timezone::get_offset_at};

/// Provides the current instant and the current calendar date.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> OffsetDateTime;

    /// The current calendar date in the ledger's timezone.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// A clock that reads the system time and converts it to a local timezone.
#[derive(Debug, Clone)]
pub struct LocalClock {
    timezone: String,
}

impl LocalClock {
    /// Create a clock for the canonical timezone name `timezone`, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `timezone` is not a known timezone.
    pub fn new(timezone: &str) -> Result<Self, Error> {
        match get_offset_at(timezone, OffsetDateTime::now_utc()) {
            Some(_) => Ok(Self {
                timezone: timezone.to_owned(),
            }),
            None => Err(Error::InvalidTimezoneError(timezone.to_owned())),
        }
    }
}

impl Clock for LocalClock {
    fn now(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();

        // The name was validated in `new`, but the offset can still change
        // with daylight saving so it is looked up on every call.
        match get_offset_at(&self.timezone, now) {
            Some(offset) => now.to_offset(offset),
            None => now,
        }
    }
}

/// A clock that is stopped at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl FixedClock {
    /// A clock stopped at midday UTC on `date`.
    pub fn on(date: Date) -> Self {
        Self(date.with_time(time!(12:00)).assume_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use crate::Error;

    use super::{Clock, FixedClock, LocalClock};

    #[test]
    fn fixed_clock_returns_its_date() {
        let clock = FixedClock::on(date!(2025 - 04 - 20));

        assert_eq!(clock.today(), date!(2025 - 04 - 20));
        assert_eq!(clock.now(), datetime!(2025-04-20 12:00 UTC));
    }

    #[test]
    fn today_uses_the_offset_of_the_instant() {
        let clock = FixedClock(datetime!(2025-04-20 23:30 -5));

        assert_eq!(clock.today(), date!(2025 - 04 - 20));
    }

    #[test]
    fn local_clock_rejects_unknown_timezone() {
        let result = LocalClock::new("Not/AZone");

        assert_eq!(
            result.err(),
            Some(Error::InvalidTimezoneError("Not/AZone".to_owned()))
        );
    }

    #[test]
    fn local_clock_accepts_canonical_timezone() {
        assert!(LocalClock::new("Pacific/Auckland").is_ok());
    }
}
