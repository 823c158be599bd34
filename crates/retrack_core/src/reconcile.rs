//! Date/interval reconciliation rules.
//!
//! # Responsibility
//! - Compute days-left, next-due date, and whole-day distances.
//! - Keep last date, next date, and interval consistent while one of them is
//!   being edited.
//!
//! # Invariants
//! - All functions are pure; "today" is always passed in.
//! - `DateEditDraft` always satisfies `next_date == last_replaced + interval_days`.
//! - A rejected edit leaves the draft exactly as it was.
//!
//! # Edit rule
//! - Moving the last date keeps the interval and shifts the next date.
//! - Moving the next date keeps the last date and recomputes the interval.
//! - Setting the interval keeps the last date and shifts the next date.

use chrono::{Days, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input format accepted by date edit fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Remaining days until the next service; negative when overdue.
pub fn days_left(last_replaced: NaiveDate, interval_days: u32, today: NaiveDate) -> i64 {
    let elapsed = today.signed_duration_since(last_replaced).num_days();
    i64::from(interval_days) - elapsed
}

/// Date of the next service.
///
/// Saturates at `NaiveDate::MAX` for intervals past the calendar range.
pub fn next_date(last_replaced: NaiveDate, interval_days: u32) -> NaiveDate {
    last_replaced
        .checked_add_days(Days::new(u64::from(interval_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Absolute whole-day distance between two dates.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    b.signed_duration_since(a).num_days().abs()
}

/// Parses a `YYYY-MM-DD` edit field value.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| DateParseError {
        input: trimmed.to_string(),
    })
}

/// Date field value that is not a valid `YYYY-MM-DD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub input: String,
}

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid date `{}`; expected YYYY-MM-DD", self.input)
    }
}

impl Error for DateParseError {}

/// Rejected edit on a `DateEditDraft`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateEditError {
    Parse(DateParseError),
    /// The next date must fall strictly after the last date.
    NextNotAfterLast {
        last_replaced: NaiveDate,
        next_date: NaiveDate,
    },
    /// Interval must be at least one day.
    ZeroInterval,
    /// Interval does not fit the supported range.
    IntervalOutOfRange(i64),
}

impl Display for DateEditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::NextNotAfterLast {
                last_replaced,
                next_date,
            } => write!(
                f,
                "next date {next_date} must be after last replaced date {last_replaced}"
            ),
            Self::ZeroInterval => write!(f, "replacement interval must be at least 1 day"),
            Self::IntervalOutOfRange(days) => {
                write!(f, "replacement interval of {days} days is out of range")
            }
        }
    }
}

impl Error for DateEditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DateParseError> for DateEditError {
    fn from(value: DateParseError) -> Self {
        Self::Parse(value)
    }
}

/// Pending last/next/interval values for one item's date editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateEditDraft {
    last_replaced: NaiveDate,
    next_date: NaiveDate,
    interval_days: u32,
}

impl DateEditDraft {
    /// Seeds a draft from stored values.
    ///
    /// # Errors
    /// - `ZeroInterval` when `interval_days == 0`.
    pub fn new(last_replaced: NaiveDate, interval_days: u32) -> Result<Self, DateEditError> {
        if interval_days == 0 {
            return Err(DateEditError::ZeroInterval);
        }
        Ok(Self {
            last_replaced,
            next_date: next_date(last_replaced, interval_days),
            interval_days,
        })
    }

    pub fn last_replaced(&self) -> NaiveDate {
        self.last_replaced
    }

    pub fn next_date(&self) -> NaiveDate {
        self.next_date
    }

    pub fn interval_days(&self) -> u32 {
        self.interval_days
    }

    /// Moves the last date; the interval holds and the next date follows.
    pub fn set_last_replaced(&mut self, date: NaiveDate) {
        self.last_replaced = date;
        self.next_date = next_date(date, self.interval_days);
    }

    /// Moves the next date; the interval is recomputed from both dates.
    pub fn set_next_date(&mut self, date: NaiveDate) -> Result<(), DateEditError> {
        if date <= self.last_replaced {
            return Err(DateEditError::NextNotAfterLast {
                last_replaced: self.last_replaced,
                next_date: date,
            });
        }
        let days = days_between(self.last_replaced, date);
        let interval = u32::try_from(days).map_err(|_| DateEditError::IntervalOutOfRange(days))?;
        self.interval_days = interval;
        self.next_date = date;
        Ok(())
    }

    /// Sets the interval; the next date follows.
    pub fn set_interval(&mut self, interval_days: u32) -> Result<(), DateEditError> {
        if interval_days == 0 {
            return Err(DateEditError::ZeroInterval);
        }
        self.interval_days = interval_days;
        self.next_date = next_date(self.last_replaced, interval_days);
        Ok(())
    }

    /// Parses and applies a last-date field value.
    pub fn edit_last_replaced(&mut self, input: &str) -> Result<(), DateEditError> {
        let date = parse_date(input)?;
        self.set_last_replaced(date);
        Ok(())
    }

    /// Parses and applies a next-date field value.
    pub fn edit_next_date(&mut self, input: &str) -> Result<(), DateEditError> {
        let date = parse_date(input)?;
        self.set_next_date(date)
    }
}

#[cfg(test)]
mod tests {
    use super::{days_between, days_left, next_date, parse_date, DateEditDraft, DateEditError};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn next_date_adds_interval_across_leap_day() {
        assert_eq!(next_date(date(2024, 2, 27), 3), date(2024, 3, 1));
        assert_eq!(next_date(date(2023, 2, 27), 3), date(2023, 3, 2));
        for interval in [1_u32, 7, 30, 365, 1000] {
            let start = date(2022, 11, 5);
            assert_eq!(
                next_date(start, interval),
                start + chrono::Duration::days(i64::from(interval))
            );
        }
    }

    #[test]
    fn next_date_saturates_at_calendar_end() {
        assert_eq!(next_date(NaiveDate::MAX, 1), NaiveDate::MAX);
    }

    #[test]
    fn days_left_goes_negative_when_overdue() {
        let last = date(2024, 1, 1);
        assert_eq!(days_left(last, 30, date(2024, 1, 1)), 30);
        assert_eq!(days_left(last, 30, date(2024, 1, 31)), 0);
        assert_eq!(days_left(last, 30, date(2024, 2, 3)), -3);
    }

    #[test]
    fn days_between_is_symmetric() {
        let pairs = [
            (date(2024, 1, 1), date(2024, 3, 1)),
            (date(2020, 12, 31), date(2021, 1, 1)),
            (date(2024, 5, 5), date(2024, 5, 5)),
        ];
        for (a, b) in pairs {
            assert_eq!(days_between(a, b), days_between(b, a));
        }
        assert_eq!(days_between(date(2024, 1, 1), date(2024, 3, 1)), 60);
    }

    #[test]
    fn parse_date_trims_and_rejects_garbage() {
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), date(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_err());
        assert_eq!(parse_date("tomorrow").unwrap_err().input, "tomorrow");
    }

    #[test]
    fn moving_last_date_keeps_interval() {
        let mut draft = DateEditDraft::new(date(2024, 1, 1), 30).unwrap();
        draft.set_last_replaced(date(2024, 1, 10));
        assert_eq!(draft.interval_days(), 30);
        assert_eq!(draft.next_date(), date(2024, 2, 9));
    }

    #[test]
    fn moving_next_date_recomputes_interval() {
        let mut draft = DateEditDraft::new(date(2024, 1, 1), 30).unwrap();
        draft.set_next_date(date(2024, 1, 15)).unwrap();
        assert_eq!(draft.interval_days(), 14);
        assert_eq!(draft.last_replaced(), date(2024, 1, 1));
    }

    #[test]
    fn next_date_on_or_before_last_is_rejected_without_change() {
        let mut draft = DateEditDraft::new(date(2024, 1, 1), 30).unwrap();
        let before = draft;
        let err = draft.set_next_date(date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, DateEditError::NextNotAfterLast { .. }));
        assert_eq!(draft, before);
    }

    #[test]
    fn unparseable_field_leaves_draft_at_prior_value() {
        let mut draft = DateEditDraft::new(date(2024, 1, 1), 30).unwrap();
        let before = draft;
        assert!(matches!(
            draft.edit_last_replaced("01/02/2024"),
            Err(DateEditError::Parse(_))
        ));
        assert!(matches!(
            draft.edit_next_date(""),
            Err(DateEditError::Parse(_))
        ));
        assert_eq!(draft, before);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert_eq!(
            DateEditDraft::new(date(2024, 1, 1), 0).unwrap_err(),
            DateEditError::ZeroInterval
        );
        let mut draft = DateEditDraft::new(date(2024, 1, 1), 5).unwrap();
        assert_eq!(draft.set_interval(0).unwrap_err(), DateEditError::ZeroInterval);
        draft.set_interval(10).unwrap();
        assert_eq!(draft.next_date(), date(2024, 1, 11));
    }
}
