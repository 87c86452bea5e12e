//! Time-of-day arithmetic for attendance records.
//!
//! Durations are exchanged as Go-style short strings (`"1h15m0s"`, `"0s"`),
//! always rounded to the nearest minute before formatting.

use chrono::{Duration, NaiveTime};
use derive_more::Display;

const NANOS_PER_MINUTE: i64 = 60_000_000_000;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum DurationError {
    #[display(fmt = "invalid duration {:?}", _0)]
    Invalid(String),
    #[display(fmt = "missing unit in duration {:?}", _0)]
    MissingUnit(String),
    #[display(fmt = "unknown unit {:?} in duration {:?}", _0, _1)]
    UnknownUnit(String, String),
}

impl std::error::Error for DurationError {}

/// Rounds to the nearest minute; half a minute rounds away from zero.
pub fn round_to_minute(d: Duration) -> Duration {
    let nanos = d.num_nanoseconds().unwrap_or_else(|| d.num_milliseconds() * 1_000_000);
    let whole = (nanos.abs() + NANOS_PER_MINUTE / 2) / NANOS_PER_MINUTE;
    Duration::minutes(if nanos < 0 { -whole } else { whole })
}

/// Formats at second resolution the way Go's `time.Duration` prints.
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds();
    if secs == 0 {
        return "0s".to_string();
    }

    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.unsigned_abs();
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);

    if h > 0 {
        format!("{sign}{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{sign}{m}m{s}s")
    } else {
        format!("{sign}{s}s")
    }
}

fn unit_nanos(unit: &str) -> Option<f64> {
    Some(match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        "h" => 3600e9,
        _ => return None,
    })
}

/// Parses Go's duration grammar: `[-+]?(<decimal><unit>)+`, or a bare `0`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total = 0f64;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..num_len];
        if number.is_empty() || number == "." {
            return Err(invalid());
        }
        let value: f64 = number.parse().map_err(|_| invalid())?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit)
            .ok_or_else(|| DurationError::UnknownUnit(unit.to_string(), input.to_string()))?;
        rest = &rest[unit_len..];

        total += value * scale;
    }

    if !total.is_finite() || total > i64::MAX as f64 {
        return Err(invalid());
    }

    let nanos = total.round() as i64;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

/// Whole minutes in a formatted duration, truncated toward zero.
pub fn duration_to_minutes(input: &str) -> Result<i64, DurationError> {
    Ok(parse_duration(input)?.num_minutes())
}

/// How late `actual_in` is against `scheduled_in`; `"0s"` when on time.
pub fn lateness(scheduled_in: NaiveTime, actual_in: NaiveTime) -> String {
    if actual_in > scheduled_in {
        format_duration(round_to_minute(actual_in.signed_duration_since(scheduled_in)))
    } else {
        "0s".to_string()
    }
}

/// How early `actual_out` is against `scheduled_out`; `"0s"` when not early.
pub fn early_leaving(scheduled_out: NaiveTime, actual_out: NaiveTime) -> String {
    if actual_out < scheduled_out {
        format_duration(round_to_minute(scheduled_out.signed_duration_since(actual_out)))
    } else {
        "0s".to_string()
    }
}

/// Elapsed time between check-in and check-out of the same day.
pub fn worked_time(in_time: NaiveTime, out_time: NaiveTime) -> String {
    format_duration(round_to_minute(out_time.signed_duration_since(in_time)))
}
