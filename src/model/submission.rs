//! Submission model for shiftx.
//!
//! A submission is one employee's availability for a shift-month: a header
//! (who, which month) plus one detail line per target date.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month in `YYYY-MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Build a year-month, rejecting months outside 1..=12.
    ///
    /// # Errors
    ///
    /// Returns a message if the month is out of range.
    pub fn new(year: i32, month: u32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("Invalid month {month}: expected 1-12"));
        }
        if !(1000..=9999).contains(&year) {
            return Err(format!("Invalid year {year}: expected four digits"));
        }
        Ok(Self { year, month })
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Compact `YYYYMM` form used in artifact prefixes and directory names.
    #[must_use]
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// Whether `date` falls inside this month.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid year-month '{s}': expected YYYY-MM"))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(format!("Invalid year-month '{s}': expected YYYY-MM"));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in '{s}'"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in '{s}'"))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Availability declared for one target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Can work the whole shift.
    Available,
    /// Cannot work.
    Unavailable,
    /// May work; details usually in the time-range memo.
    Tentative,
}

impl Availability {
    /// Get the string representation for storage and export.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Tentative => "tentative",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            "tentative" => Ok(Self::Tentative),
            _ => Err(format!("Unknown availability: {s}")),
        }
    }
}

/// One availability line of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDetail {
    /// Identifier assigned by the data layer
    pub id: i64,

    /// Date this line applies to
    pub target_date: NaiveDate,

    /// Declared availability
    pub availability: Availability,

    /// Free-text time range (e.g., "09:00-13:00")
    pub time_range: Option<String>,
}

/// A monthly availability submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Identifier assigned by the data layer
    pub id: i64,

    /// Shift-month this submission covers
    pub year_month: YearMonth,

    /// Submitting employee
    pub employee_id: i64,

    /// Submission timestamp (Unix milliseconds)
    pub submitted_at: i64,

    /// Detail lines, one per target date
    pub details: Vec<SubmissionDetail>,
}
