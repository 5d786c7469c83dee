use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::BookingError;

/// An inclusive rental span. `end == start` is a one-day rental.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl RentalPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate, max_days: i64) -> Result<Self, BookingError> {
        if end < start {
            return Err(BookingError::Validation {
                field: "date_range",
                reason: format!("end date {end} is before start date {start}"),
            });
        }
        let period = Self { start, end };
        if period.duration_days() > max_days {
            return Err(BookingError::Validation {
                field: "date_range",
                reason: format!(
                    "rental span of {} days exceeds the maximum of {max_days}",
                    period.duration_days()
                ),
            });
        }
        Ok(period)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive day count: a same-day rental is 1 day.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Pushes the end date forward for an accepted extension. The new end
    /// must be strictly later than the current one, and the extended span
    /// stays under the same cap that construction enforces.
    pub fn extend_to(&mut self, new_end: NaiveDate, max_days: i64) -> Result<(), BookingError> {
        if new_end <= self.end {
            return Err(BookingError::Validation {
                field: "extension_end",
                reason: format!("extension end {new_end} is not after current end {}", self.end),
            });
        }
        let extended = Self { start: self.start, end: new_end };
        if extended.duration_days() > max_days {
            return Err(BookingError::Validation {
                field: "extension_end",
                reason: format!(
                    "extended span of {} days exceeds the maximum of {max_days}",
                    extended.duration_days()
                ),
            });
        }
        self.end = new_end;
        Ok(())
    }

    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}
