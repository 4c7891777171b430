//! Date stepping for recurring chains.
//!
//! Monthly steps keep the day of the month and let days that do not exist in
//! the target month overflow into the following month, e.g. 31 January steps
//! to 3 March (2 March in a leap year). The overflowed date becomes the base
//! for the next step, so a chain started on the 31st drifts to the 3rd and
//! stays there.

use time::{Date, Duration, Month};

use crate::{Error, transaction::Recurrence};

/// The number of days between occurrences of a bi-weekly chain.
const BI_WEEKLY_DAYS: i64 = 14;

/// Get the date of the occurrence that follows `date` for a chain repeating
/// every `recurring`.
///
/// Returns `None` for [Recurrence::Once], which has no next occurrence.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the next date cannot be represented.
pub fn next_occurrence(recurring: Recurrence, date: Date) -> Result<Option<Date>, Error> {
    match recurring {
        Recurrence::Once => Ok(None),
        Recurrence::Monthly => add_months(date, 1).map(Some),
        Recurrence::BiWeekly => add_days(date, BI_WEEKLY_DAYS).map(Some),
    }
}

/// Iterate over the occurrences that follow `start`, up to and including `limit`.
///
/// `start` itself is never yielded. A step that cannot be represented lies past
/// any `limit`, so it ends the iteration.
pub fn occurrences(recurring: Recurrence, start: Date, limit: Date) -> Occurrences {
    Occurrences {
        recurring,
        last: start,
        limit,
        finished: false,
    }
}

/// The iterator returned by [occurrences].
#[derive(Debug, Clone)]
pub struct Occurrences {
    recurring: Recurrence,
    last: Date,
    limit: Date,
    finished: bool,
}

impl Iterator for Occurrences {
    type Item = Date;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match next_occurrence(self.recurring, self.last) {
            Ok(Some(date)) if date <= self.limit => {
                self.last = date;
                Some(date)
            }
            _ => {
                self.finished = true;
                None
            }
        }
    }
}

/// Add `months` calendar months to `date`, which may be negative.
///
/// If the day of `date` does not exist in the target month, the excess days
/// carry over into the next month.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the result cannot be represented.
pub fn add_months(date: Date, months: i32) -> Result<Date, Error> {
    let month_index = date.year() * 12 + i32::from(u8::from(date.month())) - 1 + months;
    let year = month_index.div_euclid(12);
    let month_number = month_index.rem_euclid(12) + 1;

    let month = u8::try_from(month_number)
        .ok()
        .and_then(|number| Month::try_from(number).ok())
        .ok_or(Error::DateOutOfRange(date))?;

    let first_of_month =
        Date::from_calendar_date(year, month, 1).map_err(|_| Error::DateOutOfRange(date))?;

    add_days(first_of_month, i64::from(date.day()) - 1)
}

/// Add `days` days to `date`, which may be negative.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the result cannot be represented.
pub fn add_days(date: Date, days: i64) -> Result<Date, Error> {
    date.checked_add(Duration::days(days))
        .ok_or(Error::DateOutOfRange(date))
}
