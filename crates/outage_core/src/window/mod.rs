use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime, Time, UtcOffset};

use crate::error::{codes, AppError};

/// Half-open reporting window `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportWindow {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl ReportWindow {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::new(codes::WINDOW_INVALID, "Window end precedes start")
                .with_details(format!("start={start}; end={end}")));
        }
        Ok(Self { start, end })
    }

    /// One clock hour of `date` in `offset`.
    pub fn hour(date: Date, hour: u8, offset: UtcOffset) -> Result<Self, AppError> {
        let t = Time::from_hms(hour, 0, 0).map_err(|e| {
            AppError::new(codes::WINDOW_INVALID, "Invalid hour for hourly window")
                .with_details(format!("hour={hour}; err={e}"))
        })?;
        Self::spanning(date.with_time(t).assume_offset(offset), Duration::HOUR)
    }

    /// `[date 00:00, date+1 00:00)` in `offset`. Fails only at the end of the calendar.
    pub fn day(date: Date, offset: UtcOffset) -> Result<Self, AppError> {
        Self::spanning(date.midnight().assume_offset(offset), Duration::DAY)
    }

    pub fn month(year: i32, month: Month, offset: UtcOffset) -> Result<Self, AppError> {
        let first = first_of_month(year, month)?;
        let days = time::util::days_in_year_month(year, month);
        Self::spanning(
            first.midnight().assume_offset(offset),
            Duration::days(i64::from(days)),
        )
    }

    fn spanning(start: OffsetDateTime, length: Duration) -> Result<Self, AppError> {
        let end = start.checked_add(length).ok_or_else(|| {
            AppError::new(codes::WINDOW_INVALID, "Window end is past the representable range")
                .with_details(format!("start={start}; length={length}"))
        })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        self.start <= ts && ts < self.end
    }
}

pub(crate) fn first_of_month(year: i32, month: Month) -> Result<Date, AppError> {
    Date::from_calendar_date(year, month, 1).map_err(|e| {
        AppError::new(codes::WINDOW_INVALID, "Invalid year/month")
            .with_details(format!("year={year}; month={month}; err={e}"))
    })
}

/// Calendar date of `ts` as observed in `offset`, or `None` when that local time falls
/// outside the representable calendar (e.g. a `9999-12-31T23:59:59Z` placeholder at `+03:00`).
pub fn local_date(ts: OffsetDateTime, offset: UtcOffset) -> Option<Date> {
    ts.checked_to_offset(offset).map(|local| local.date())
}
