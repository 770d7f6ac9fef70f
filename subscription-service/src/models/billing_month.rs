//! Billing period month codec.
//!
//! A billing period is a calendar month. It is accepted as `MM-YYYY` or
//! `YYYY-MM`, stored as the first day of the month (a `DATE` column, so
//! there is no time-of-day or offset to drift), and always rendered as
//! `YYYY-MM`.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use thiserror::Error;

/// Canonical output layout.
const CANONICAL_FORMAT: &str = "%Y-%m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MonthParseError {
    #[error("month is required")]
    Empty,

    #[error("invalid month format")]
    InvalidFormat,
}

/// A calendar month, held as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct BillingMonth(NaiveDate);

impl BillingMonth {
    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Parse `MM-YYYY` or `YYYY-MM`, ignoring surrounding whitespace.
    ///
    /// Layouts are tried in that order. Each segment must have exactly the
    /// expected number of ASCII digits; anything else is rejected.
    pub fn parse(value: &str) -> Result<Self, MonthParseError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(MonthParseError::Empty);
        }

        let (first, second) = value
            .split_once('-')
            .ok_or(MonthParseError::InvalidFormat)?;

        let (year, month) = match (first.len(), second.len()) {
            (2, 4) => (second, first),
            (4, 2) => (first, second),
            _ => return Err(MonthParseError::InvalidFormat),
        };

        let year = parse_digits(year)? as i32;
        let month = parse_digits(month)?;

        Self::from_ym(year, month).ok_or(MonthParseError::InvalidFormat)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }
}

fn parse_digits(segment: &str) -> Result<u32, MonthParseError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MonthParseError::InvalidFormat);
    }
    segment
        .parse()
        .map_err(|_| MonthParseError::InvalidFormat)
}

/// Render an optional month; an unset month renders as an empty string.
pub fn format_month(month: Option<BillingMonth>) -> String {
    month.map(|m| m.to_string()).unwrap_or_default()
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}
