//! Input rules shared by every path that creates or edits entities. Nothing is mutated until
//! these pass.

use chrono::NaiveDate;
use thiserror::Error;

use crate::utils::time::SECONDS_PER_HOUR;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("a project named {0:?} already exists")]
    DuplicateProject(String),

    #[error("a ticket with id {0:?} already exists")]
    DuplicateTicket(String),

    #[error("duration must be greater than zero")]
    NonPositiveDuration,

    #[error("{value:?} is not a valid number of {field}")]
    MalformedNumber { field: &'static str, value: String },

    #[error("due date {due} must be after start date {start}")]
    DueNotAfterStart { start: NaiveDate, due: NaiveDate },
}

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(value.to_string())
    }
}

/// Empty notes are stored as absent.
pub fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn ensure_due_after(start: NaiveDate, due: NaiveDate) -> Result<(), ValidationError> {
    if due > start {
        Ok(())
    } else {
        Err(ValidationError::DueNotAfterStart { start, due })
    }
}

pub fn ensure_positive_hours(hours: f64) -> Result<f64, ValidationError> {
    // NaN fails this comparison as well.
    if hours > 0. && hours.is_finite() {
        Ok(hours)
    } else {
        Err(ValidationError::NonPositiveDuration)
    }
}

/// Duration typed in by hand as separate hour, minute and second fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManualDuration {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ManualDuration {
    /// Parses the three text fields. Blank fields count as zero.
    pub fn parse(hours: &str, minutes: &str, seconds: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            hours: parse_component("hours", hours)?,
            minutes: parse_component("minutes", minutes)?,
            seconds: parse_component("seconds", seconds)?,
        })
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }

    /// Fractional hours ready to be stored, rejecting an all zero duration.
    pub fn to_hours(&self) -> Result<f64, ValidationError> {
        ensure_positive_hours(self.total_seconds() as f64 / SECONDS_PER_HOUR)
    }
}

fn parse_component(field: &'static str, value: &str) -> Result<u32, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse::<u32>()
        .map_err(|_| ValidationError::MalformedNumber {
            field,
            value: value.to_string(),
        })
}
