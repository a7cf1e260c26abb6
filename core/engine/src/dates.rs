//! FILENAME: core/engine/src/dates.rs
//! PURPOSE: Shared date parsing and canonical date keys.
//! CONTEXT: The classifier, date bins, the date filters, and the sort engine
//! all normalize through here. Excel serial numbers (epoch 1899-12-30) and
//! the localized "YYYY年MM月DD日" form are accepted where spreadsheet data
//! leaks them in.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::value::Scalar;

/// Milliseconds per day, used for Excel serial conversion.
const MS_PER_DAY: f64 = 86_400_000.0;

/// Quick shape check used by the sort engine to decide whether to attempt
/// a date comparison at all.
static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}([-/]\d{1,2}[-/]\d{1,2}|年\d{1,2}月\d{1,2}日)").unwrap()
});

/// Datetime formats tried in order by `parse_date_str`.
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only formats tried after the datetime ones.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"];

/// Parses a date or datetime string. Returns midnight for date-only forms.
pub fn parse_date_str(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Converts an Excel serial date (days since 1899-12-30) to a datetime.
/// Fractional days carry the time of day.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        // 2958465 = 9999-12-31 in serial form; beyond that is garbage input.
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let ms = (serial * MS_PER_DAY).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(ms))
}

/// Canonical group key for a date: "YYYY-MM-DD".
pub fn date_key(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Extends a date to the last instant of its day, for inclusive bin and
/// range upper edges.
pub fn end_of_day(d: NaiveDate) -> NaiveDateTime {
    // In range for every valid date, so this cannot fail.
    d.and_hms_milli_opt(23, 59, 59, 999).expect("in-range time of day")
}

/// Returns true when the string is shaped like a date (used to gate the
/// date branch of the generic comparator).
pub fn looks_like_date(s: &str) -> bool {
    DATE_SHAPE.is_match(s.trim())
}

/// Date view used by the date-range filter: native dates, parseable text,
/// and (unlike `Scalar::as_date`) raw numbers read as Excel serials.
pub fn coerce_date(value: &Scalar) -> Option<NaiveDateTime> {
    match value {
        Scalar::Date(dt) => Some(*dt),
        Scalar::Text(s) => parse_date_str(s),
        Scalar::Number(n) => excel_serial_to_datetime(*n),
        _ => None,
    }
}
