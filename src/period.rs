//! Period resolution: turns "last 7 days", "this month", "last month" or a custom range into a
//! concrete half-open `[start, end)` interval.
//!
//! Every function here is pure. Relative periods take `today` as an argument instead of reading
//! the clock.

use crate::error::{Error, ErrorType, IntoResult};
use crate::Result;
use anyhow::{anyhow, Context};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The textual date format for custom ranges, e.g. `2025-09-01`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The number of days covered by the `7d` selector in addition to today.
pub const LAST_DAYS: u32 = 7;

/// A concrete, half-open time window: `start` is included and `end` is excluded. `start < end`
/// always holds and both fall on midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalBounds")]
pub struct ResolvedInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// The unchecked serialized form of a `ResolvedInterval`.
#[derive(Deserialize)]
struct IntervalBounds {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<IntervalBounds> for ResolvedInterval {
    type Error = Error;

    fn try_from(bounds: IntervalBounds) -> Result<Self> {
        if bounds.start.time() != NaiveTime::MIN || bounds.end.time() != NaiveTime::MIN {
            return Err(Error::new(
                ErrorType::InvalidRange,
                anyhow!(
                    "Periods start and end at midnight, got {} and {}",
                    bounds.start,
                    bounds.end
                ),
            ));
        }
        Self::from_dates(bounds.start.date(), bounds.end.date())
    }
}

impl ResolvedInterval {
    /// Creates an interval from midnight of `start` to midnight of `end_exclusive`.
    ///
    /// # Errors
    /// Returns an `InvalidRange` error unless `start < end_exclusive`.
    pub fn from_dates(start: NaiveDate, end_exclusive: NaiveDate) -> Result<Self> {
        if start >= end_exclusive {
            return Err(Error::new(
                ErrorType::InvalidRange,
                anyhow!("The start of a period must come before its end ({start} >= {end_exclusive})"),
            ));
        }
        Ok(Self {
            start: start.and_time(NaiveTime::MIN),
            end: end_exclusive.and_time(NaiveTime::MIN),
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// The exclusive end of the interval.
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// `start` as an ISO-8601 string, e.g. `2025-09-01T00:00:00`, suitable for storage queries.
    pub fn start_iso(&self) -> String {
        self.start.format(ISO_FORMAT).to_string()
    }

    /// `end` as an ISO-8601 string, e.g. `2025-09-30T00:00:00`, suitable for storage queries.
    pub fn end_iso(&self) -> String {
        self.end.format(ISO_FORMAT).to_string()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// The last calendar day inside the interval, i.e. the day before `end`.
    pub fn end_date_inclusive(&self) -> NaiveDate {
        // start < end and both are midnights, so end is at least one day after start
        self.end.date().pred_opt().unwrap_or(self.start.date())
    }

    /// The number of whole days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Returns `true` if `dt` falls within `[start, end)`.
    pub fn contains(&self, dt: NaiveDateTime) -> bool {
        self.start <= dt && dt < self.end
    }
}

impl Display for ResolvedInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start_date(), self.end_date_inclusive())
    }
}

/// A period as requested by a user, before it is resolved against a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodRequest {
    /// Today plus the `n` full days before it.
    LastDays(u32),
    /// The calendar month containing today.
    ThisMonth,
    /// The calendar month before the one containing today.
    LastMonth,
    /// An explicit calendar month.
    Month { year: i32, month: u32 },
    /// An explicit range of dates. Both ends are included.
    Custom {
        start: NaiveDate,
        end_inclusive: NaiveDate,
    },
}

/// The period choices offered by the chat front-end, identified by short ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodSelector {
    #[serde(rename = "7d")]
    LastSevenDays,
    ThisMonth,
    LastMonth,
    Custom,
}

serde_plain::derive_display_from_serialize!(PeriodSelector);
serde_plain::derive_fromstr_from_deserialize!(PeriodSelector);

impl PeriodSelector {
    pub const ALL: [PeriodSelector; 4] = [
        PeriodSelector::LastSevenDays,
        PeriodSelector::ThisMonth,
        PeriodSelector::LastMonth,
        PeriodSelector::Custom,
    ];

    /// The request this selector stands for. `Custom` has none because it needs dates from the
    /// user first.
    pub fn preset(self) -> Option<PeriodRequest> {
        match self {
            PeriodSelector::LastSevenDays => Some(PeriodRequest::LastDays(LAST_DAYS)),
            PeriodSelector::ThisMonth => Some(PeriodRequest::ThisMonth),
            PeriodSelector::LastMonth => Some(PeriodRequest::LastMonth),
            PeriodSelector::Custom => None,
        }
    }

    /// A human-readable label for menus.
    pub fn label(self) -> &'static str {
        match self {
            PeriodSelector::LastSevenDays => "Last 7 days",
            PeriodSelector::ThisMonth => "This month",
            PeriodSelector::LastMonth => "Last month",
            PeriodSelector::Custom => "Custom period",
        }
    }
}

/// Resolves any `PeriodRequest` relative to `today`.
pub fn resolve_period(request: &PeriodRequest, today: NaiveDate) -> Result<ResolvedInterval> {
    match *request {
        PeriodRequest::LastDays(n) => resolve_last_n_days(today, n),
        PeriodRequest::ThisMonth => resolve_calendar_month(today),
        PeriodRequest::LastMonth => resolve_previous_calendar_month(today),
        PeriodRequest::Month { year, month } => resolve_month(year, month),
        PeriodRequest::Custom {
            start,
            end_inclusive,
        } => resolve_custom_dates(start, end_inclusive),
    }
}

/// `[today - n days, today + 1 day)`: today in full plus exactly `n` prior days.
pub fn resolve_last_n_days(today: NaiveDate, n: u32) -> Result<ResolvedInterval> {
    let start = today
        .checked_sub_days(Days::new(u64::from(n)))
        .with_context(|| format!("{n} days before {today} is out of range"))
        .pub_result(ErrorType::InvalidRange)?;
    let end = next_day(today)?;
    ResolvedInterval::from_dates(start, end)
}

/// The calendar month containing `today`: from its 1st up to the 1st of the following month.
pub fn resolve_calendar_month(today: NaiveDate) -> Result<ResolvedInterval> {
    let start = first_of_month(today)?;
    let end = first_of_next_month(start)?;
    ResolvedInterval::from_dates(start, end)
}

/// The calendar month before the one containing `today`: from its 1st up to the 1st of today's
/// month.
pub fn resolve_previous_calendar_month(today: NaiveDate) -> Result<ResolvedInterval> {
    let end = first_of_month(today)?;
    let last_day_of_previous = end
        .pred_opt()
        .with_context(|| format!("There is no month before {end}"))
        .pub_result(ErrorType::InvalidRange)?;
    let start = first_of_month(last_day_of_previous)?;
    ResolvedInterval::from_dates(start, end)
}

/// An explicit calendar month, e.g. `(2025, 2)` for February 2025.
pub fn resolve_month(year: i32, month: u32) -> Result<ResolvedInterval> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("{year}-{month:02} is not a valid calendar month"))
        .pub_result(ErrorType::InvalidRange)?;
    let end = first_of_next_month(start)?;
    ResolvedInterval::from_dates(start, end)
}

/// A custom range given as two `YYYY-MM-DD` strings, both ends included.
///
/// # Errors
/// Returns an `InvalidRange` error if either date does not parse or if `start` is after
/// `end_inclusive`.
pub fn resolve_custom(start: &str, end_inclusive: &str) -> Result<ResolvedInterval> {
    let start = parse_date(start)?;
    let end_inclusive = parse_date(end_inclusive)?;
    resolve_custom_dates(start, end_inclusive)
}

/// Parses user text of the form `YYYY-MM-DD YYYY-MM-DD` into an interval.
///
/// # Errors
/// Returns an `InvalidRange` error unless the text holds exactly two whitespace-separated dates
/// that `resolve_custom` accepts.
pub fn parse_custom_range(text: &str) -> Result<ResolvedInterval> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    match parts.as_slice() {
        [start, end_inclusive] => resolve_custom(start, end_inclusive),
        _ => Err(Error::new(
            ErrorType::InvalidRange,
            anyhow!(
                "Two dates separated by a space are required: YYYY-MM-DD YYYY-MM-DD (got {} values)",
                parts.len()
            ),
        )),
    }
}

/// Parses a single `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
        Error::new(
            ErrorType::InvalidRange,
            anyhow!("Dates must be in the format YYYY-MM-DD, got '{}'", s.trim()),
        )
    })
}

fn resolve_custom_dates(start: NaiveDate, end_inclusive: NaiveDate) -> Result<ResolvedInterval> {
    if start > end_inclusive {
        return Err(Error::new(
            ErrorType::InvalidRange,
            anyhow!("The start date {start} is after the end date {end_inclusive}"),
        ));
    }
    let end = next_day(end_inclusive)?;
    ResolvedInterval::from_dates(start, end)
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .with_context(|| format!("There is no day after {date}"))
        .pub_result(ErrorType::InvalidRange)
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate> {
    date.with_day(1)
        .with_context(|| format!("Unable to find the first day of the month of {date}"))
        .pub_result(ErrorType::InvalidRange)
}

fn first_of_next_month(date: NaiveDate) -> Result<NaiveDate> {
    let next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    next.with_context(|| format!("There is no month after {date}"))
        .pub_result(ErrorType::InvalidRange)
}
