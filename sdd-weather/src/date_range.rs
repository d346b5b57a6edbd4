use chrono::{NaiveDate, TimeDelta};
use std::mem::replace;

/// Iterator over each calendar date from the start date through the end
/// date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// Dates of the range that do not occur in `present`.
    ///
    /// `present` must be sorted ascending; dates outside the range are ignored.
    pub fn missing_from(self, present: &[NaiveDate]) -> Vec<NaiveDate> {
        self.filter(|date| present.binary_search(date).is_err())
            .collect()
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0 + TimeDelta::days(1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}
