use chrono::{DateTime, Duration, NaiveTime, TimeZone};

pub const SECONDS_PER_HOUR: f64 = 3600.;

/// This is the standard way of showing a duration in ticktrack, used both for a running timer
/// and for logged hours. Components are truncated, never rounded.
pub fn format_duration(total_seconds: f64) -> String {
    let total = total_seconds.max(0.).floor() as u64;
    format!(
        "{}h {}min {}s",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

pub fn format_hours(hours: f64) -> String {
    format_duration(hours * SECONDS_PER_HOUR)
}

/// Converts a duration into fractional hours with millisecond precision.
pub fn duration_to_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000. / SECONDS_PER_HOUR
}

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: DateTime<Tz>) -> Option<DateTime<Tz>> {
    (date + Duration::days(1)).with_time(NaiveTime::MIN).single()
}
