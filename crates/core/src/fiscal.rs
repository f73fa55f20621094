//! Fiscal-year bucketing for record creation dates
//!
//! Federal fiscal year FYnn runs from October 1 of `2000 + nn - 1` through
//! September 30 of `2000 + nn`, both ends inclusive. Only FY16 through FY21
//! are labelled; every other date classifies to an empty string.
//!
//! The legacy spreadsheets were produced with a different table (exclusive
//! bounds, windows shifted by one year, FY19 shadowed by FY18). That table is
//! kept as [`FiscalCalendar::Legacy`] so old output can be reproduced.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// First labelled fiscal year (two-digit form)
pub const FIRST_FISCAL_YEAR: i32 = 16;

/// Last labelled fiscal year (two-digit form)
pub const LAST_FISCAL_YEAR: i32 = 21;

/// Legacy windows: label and the calendar year whose October opens the window.
const LEGACY_WINDOWS: [(&str, i32); 6] = [
    ("FY16", 2016),
    ("FY17", 2017),
    ("FY18", 2018),
    ("FY19", 2018),
    ("FY20", 2019),
    ("FY21", 2020),
];

/// Which fiscal-year table to classify dates against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalCalendar {
    /// October 1 through September 30, inclusive
    #[default]
    Federal,
    /// Bit-for-bit reproduction of the legacy spreadsheet labels
    Legacy,
}

impl FiscalCalendar {
    pub fn classify(self, date: NaiveDate) -> String {
        match self {
            FiscalCalendar::Federal => classify(date),
            FiscalCalendar::Legacy => classify_legacy(date),
        }
    }

    /// Classify a `YYYY-MM-DD` string (longer ISO-8601 strings are truncated).
    ///
    /// Unparsable input classifies to an empty string.
    pub fn classify_str(self, date: &str) -> String {
        parse_day(date)
            .map(|day| self.classify(day))
            .unwrap_or_default()
    }
}

/// Map a calendar date to `FY16`..`FY21`, or `""` outside that range.
pub fn classify(date: NaiveDate) -> String {
    // October through December already belong to the next fiscal year
    let fiscal_year = if date.month() >= 10 {
        date.year() + 1
    } else {
        date.year()
    };

    let short = fiscal_year - 2000;
    if (FIRST_FISCAL_YEAR..=LAST_FISCAL_YEAR).contains(&short) {
        format!("FY{short:02}")
    } else {
        String::new()
    }
}

fn classify_legacy(date: NaiveDate) -> String {
    LEGACY_WINDOWS
        .iter()
        .find(|(_, opening_year)| {
            // "September 31" was rolled over to October 1 of the next year
            match (october_first(*opening_year), october_first(opening_year + 1)) {
                (Some(begin), Some(end)) => begin < date && date < end,
                _ => false,
            }
        })
        .map(|(label, _)| label.to_string())
        .unwrap_or_default()
}

fn october_first(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 10, 1)
}

fn parse_day(value: &str) -> Option<NaiveDate> {
    let day = value.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
