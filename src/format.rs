//! Named display formats for resolved values.

use crate::template::format_number;
use serde_json::{Number, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// The display formats a `values` item may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    RelativeTime,
    Date,
    Bytes,
}

impl ValueFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "relativeTime" => Some(ValueFormat::RelativeTime),
            "date" => Some(ValueFormat::Date),
            "bytes" => Some(ValueFormat::Bytes),
            _ => None,
        }
    }
}

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const BYTE_UNITS: [&str; 3] = ["KB", "MB", "GB"];

/// Applies a named format to a value, using the current wall clock for `relativeTime`.
///
/// Unknown formats and `null` return the value unchanged.
pub fn format_value(raw: &Value, format: &str) -> Value {
    format_value_at(raw, format, now_millis())
}

/// Like [`format_value`], with an explicit "now" in epoch milliseconds.
pub fn format_value_at(raw: &Value, format: &str, now_ms: i64) -> Value {
    if raw.is_null() {
        return Value::Null;
    }
    let Some(kind) = ValueFormat::from_name(format) else {
        return raw.clone();
    };
    let Some(n) = numeric(raw) else {
        return raw.clone();
    };

    let formatted = match kind {
        ValueFormat::RelativeTime => Some(relative_time(n as i64, now_ms)),
        ValueFormat::Date => date(n as i64),
        ValueFormat::Bytes => bytes(n),
    };
    formatted.map(Value::String).unwrap_or_else(|| raw.clone())
}

/// Numbers, and strings holding a number (templates resolve to text).
fn numeric(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => crate::ast::parse_number(s),
        _ => None,
    }
}

fn relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let seconds = (now_ms - timestamp_ms).max(0) / 1000;
    if seconds < 60 {
        return format!("{}s ago", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

fn date(timestamp_ms: i64) -> Option<String> {
    let nanos = i128::from(timestamp_ms) * 1_000_000;
    let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
    datetime.format(DATE_FORMAT).ok()
}

fn bytes(n: f64) -> Option<String> {
    if n < 0.0 {
        return None;
    }
    if n < 1024.0 {
        let whole = Number::from_f64(n)?;
        return Some(format!("{} B", format_number(&whole)));
    }

    let mut scaled = n / 1024.0;
    let mut unit = 0;
    while scaled >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    Some(format!("{:.1} {}", scaled, BYTE_UNITS[unit]))
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
