//! Shared utility functions for the storm damage crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{FixedOffset, NaiveDate, Utc};

    /// Month names accepted by [`parse_month`], January first.
    pub const MONTH_NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a month given either by name ("June", "jun") or by number ("6").
    ///
    /// Returns the month number in 1..=12.
    pub fn parse_month(s: &str) -> Result<u32, DateError> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<u32>() {
            return match number {
                1..=12 => Ok(number),
                _ => Err(DateError(format!("month out of range: {number}"))),
            };
        }
        let lowered = trimmed.to_lowercase();
        if lowered.len() >= 3 {
            for (index, name) in MONTH_NAMES.iter().enumerate() {
                if name.to_lowercase().starts_with(&lowered) {
                    return Ok(index as u32 + 1);
                }
            }
        }
        Err(DateError(format!("unknown month: {trimmed}")))
    }

    /// Today's calendar date in a zone with a fixed UTC offset.
    pub fn today_at_offset(offset: FixedOffset) -> NaiveDate {
        Utc::now().with_timezone(&offset).date_naive()
    }

}

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("Date error: {0}")]
    pub struct DateError(pub String);
}
