//! Display helpers for sensor readings and sample ages.

use chrono::{DateTime, Utc};

use crate::models::sensors::{RawSample, SampleKey};

pub const NOT_AVAILABLE: &str = "N/A";

/// Format one metric of a sample for display, e.g. `1,234.5ppm`.
///
/// Values are rounded to two decimals with trailing zero decimals dropped and grouped in
/// thousands with `,`. A missing sample or metric yields [`NOT_AVAILABLE`].
pub fn format_reading(sample: Option<&RawSample>, key: SampleKey, suffix: &str) -> String {
    match sample.and_then(|s| s.get(key)) {
        Some(value) if value.is_finite() => format!("{}{}", format_number(value), suffix),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn format_number(value: f64) -> String {
    // Shift by two decimal places on the decimal text, so 1.005 rounds to 1.01
    let magnitude = value.abs();
    let shifted = format!("{}e2", magnitude).parse::<f64>().unwrap_or(magnitude * 100.0);
    let hundredths = shifted.round() as u128;
    let whole = hundredths / 100;
    let fraction = hundredths % 100;

    let mut out = String::new();
    if value.is_sign_negative() && hundredths > 0 {
        out.push('-');
    }
    out.push_str(&group_thousands(&whole.to_string()));
    if fraction > 0 {
        let decimals = format!("{:02}", fraction);
        out.push('.');
        out.push_str(decimals.trim_end_matches('0'));
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Human-relative age of an epoch-millisecond timestamp ("5 minutes ago", "in an hour").
///
/// Returns `None` only when there is no timestamp.
pub fn relative_time(epoch_ms: Option<i64>, now: DateTime<Utc>) -> Option<String> {
    let epoch_ms = epoch_ms?;
    let delta_ms = i128::from(now.timestamp_millis()) - i128::from(epoch_ms);
    let phrase = humanize(delta_ms.unsigned_abs());
    Some(if delta_ms < 0 {
        format!("in {}", phrase)
    } else {
        format!("{} ago", phrase)
    })
}

const MS_PER_SECOND: u128 = 1000;
const MS_PER_MINUTE: u128 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u128 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u128 = 24 * MS_PER_HOUR;

// Every unit is rounded from the raw duration, never from a smaller rounded unit.
fn humanize(abs_ms: u128) -> String {
    let seconds = round_div(abs_ms, MS_PER_SECOND);
    let minutes = round_div(abs_ms, MS_PER_MINUTE);
    let hours = round_div(abs_ms, MS_PER_HOUR);
    let days = round_div(abs_ms, MS_PER_DAY);
    // Average Gregorian month / year lengths
    let exact_days = abs_ms as f64 / MS_PER_DAY as f64;
    let months = (exact_days / 30.436_875).round() as u128;
    let years = (exact_days / 365.2425).round() as u128;

    if seconds < 45 {
        "a few seconds".to_string()
    } else if minutes <= 1 {
        "a minute".to_string()
    } else if minutes < 45 {
        format!("{} minutes", minutes)
    } else if hours <= 1 {
        "an hour".to_string()
    } else if hours < 22 {
        format!("{} hours", hours)
    } else if days <= 1 {
        "a day".to_string()
    } else if days < 26 {
        format!("{} days", days)
    } else if months <= 1 {
        "a month".to_string()
    } else if months < 11 {
        format!("{} months", months)
    } else if years <= 1 {
        "a year".to_string()
    } else {
        format!("{} years", years)
    }
}

fn round_div(value: u128, divisor: u128) -> u128 {
    (value + divisor / 2) / divisor
}
