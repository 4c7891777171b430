//! Date windows for listing records and projecting upcoming occurrences.

use std::str::FromStr;

use time::Date;

use crate::{
    Error,
    transaction::{
        parse_iso_date,
        schedule::{add_days, add_months},
    },
};

/// A named relative window anchored at today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    /// 28 days.
    FourWeeks,
    /// Three calendar months.
    ThreeMonths,
    /// Six calendar months.
    SixMonths,
    /// One calendar year.
    TwelveMonths,
}

impl RangePreset {
    /// The window that ends today and starts one preset length ago.
    ///
    /// # Errors
    /// Returns [Error::DateOutOfRange] if the start cannot be represented.
    pub fn lookback(self, today: Date) -> Result<DateWindow, Error> {
        Ok(DateWindow {
            start: self.shift(today, -1)?,
            end: today,
        })
    }

    /// The last date of the window that starts today and ends one preset length from now.
    ///
    /// # Errors
    /// Returns [Error::DateOutOfRange] if the end cannot be represented.
    pub fn horizon(self, today: Date) -> Result<Date, Error> {
        self.shift(today, 1)
    }

    fn shift(self, date: Date, direction: i32) -> Result<Date, Error> {
        match self {
            Self::FourWeeks => add_days(date, 28 * i64::from(direction)),
            Self::ThreeMonths => add_months(date, 3 * direction),
            Self::SixMonths => add_months(date, 6 * direction),
            Self::TwelveMonths => add_months(date, 12 * direction),
        }
    }
}

impl FromStr for RangePreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4w" => Ok(Self::FourWeeks),
            "3m" => Ok(Self::ThreeMonths),
            "6m" => Ok(Self::SixMonths),
            "12m" => Ok(Self::TwelveMonths),
            other => Err(Error::InvalidRange(other.to_owned())),
        }
    }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// The first date in the window.
    pub start: Date,
    /// The last date in the window.
    pub end: Date,
}

impl DateWindow {
    /// Create a window from an explicit start and end.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] unless `end` is after `start`.
    pub fn explicit(start: Date, end: Date) -> Result<Self, Error> {
        if end <= start {
            return Err(Error::InvalidDateRange { start, end });
        }

        Ok(Self { start, end })
    }
}

/// Resolve the listing window from the raw query parameters.
///
/// An explicit `start` and `end` pair takes precedence over `range`, but an
/// invalid `range` is rejected either way. Empty strings count as absent.
/// Returns `None` when no window was requested, which means "all dates".
///
/// # Errors
/// Returns:
/// - [Error::InvalidRange] if `range` is not one of the presets,
/// - [Error::MissingField] if only one of `start` and `end` is given,
/// - [Error::InvalidDate] if `start` or `end` is not a date,
/// - or [Error::InvalidDateRange] if `end` is not after `start`.
pub fn resolve_window(
    range: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
    today: Date,
) -> Result<Option<DateWindow>, Error> {
    let preset_window = match non_empty(range) {
        Some(range) => Some(range.parse::<RangePreset>()?.lookback(today)?),
        None => None,
    };

    match (non_empty(start), non_empty(end)) {
        (Some(start), Some(end)) => {
            let start = parse_iso_date("start", start)?;
            let end = parse_iso_date("end", end)?;

            DateWindow::explicit(start, end).map(Some)
        }
        (Some(_), None) => Err(Error::MissingField("end")),
        (None, Some(_)) => Err(Error::MissingField("start")),
        (None, None) => Ok(preset_window),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
