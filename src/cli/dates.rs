use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};
use now::DateTimeNow;

use crate::utils::time::next_day_start;

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub const DATE_HELP: &str =
    "Examples are \"today\", \"yesterday\", \"friday\", \"15/03/2025\", \"12:00 16/03/2025\"";

/// Parses a moment such as "2 hours ago" or "12:00 16/03/2025".
pub fn parse_moment(value: &str, style: DateStyle) -> Result<DateTime<Local>> {
    parse_date_string(value, Local::now(), style.into()).map_err(|e| {
        Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {value:?}: {e}"),
            )
            .into()
    })
}

pub fn parse_day(value: &str, style: DateStyle) -> Result<NaiveDate> {
    Ok(parse_moment(value, style)?.date_naive())
}

pub fn parse_optional_day(value: Option<&str>, style: DateStyle) -> Result<Option<NaiveDate>> {
    value.map(|v| parse_day(v, style)).transpose()
}

/// Turns an inclusive range of days into `[start of first day, start of day after last)`.
pub fn day_range(
    from: Option<&str>,
    to: Option<&str>,
    style: DateStyle,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let from = from
        .map(|v| parse_moment(v, style))
        .transpose()?
        .map(|v| v.beginning_of_day().to_utc());
    let to = to
        .map(|v| parse_moment(v, style))
        .transpose()?
        .and_then(next_day_start)
        .map(|v| v.to_utc());
    Ok((from, to))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
