//! Expiry date coercion.
//!
//! Turns a raw cell of unknown shape into a `YYYY-MM-DD` string. This is a
//! bounded heuristic, not a calendar parser:
//!
//! | Cell | Interpretation |
//! |------|----------------|
//! | native date | the date's own calendar day in its attached offset |
//! | number | spreadsheet day-serial (1900 system, with the 1900-02-29 quirk) |
//! | text, last token 4 digits | `DD/MM/YYYY` or `DD-MM-YYYY` |
//! | text, first token 4 digits | `YYYY-MM-DD` or `YYYY/MM/DD` |
//!
//! Day and month are zero-padded but never range-checked, so `31-02-2025`
//! becomes `2025-02-31`.

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::CellValue;

/// Everything a date string may keep: digits and the separators `- / .`.
static DATE_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9./-]").expect("valid regex"));

static ISO_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// Serial of the fictitious 1900-02-29 in the 1900 date system.
const LEAP_BUG_SERIAL: i64 = 60;

/// Last serial representable with a four-digit year (9999-12-31).
const MAX_SERIAL: i64 = 2_958_465;

/// Coerce a raw cell into an ISO calendar date, or `None` when the shape is
/// not understood.
pub fn coerce_date(cell: &CellValue) -> Option<String> {
    let iso = match cell {
        CellValue::Empty => return None,
        CellValue::Date(dt) => format_date(dt.date_naive()),
        CellValue::Number(n) => serial_to_iso(*n)?,
        CellValue::Text(s) => text_to_iso(s)?,
    };

    ISO_SHAPE.is_match(&iso).then_some(iso)
}

fn format_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Decode a spreadsheet day-serial. The time-of-day fraction is dropped.
pub fn serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor() as i64;
    if !(1..=MAX_SERIAL).contains(&days) {
        return None;
    }

    match days.cmp(&LEAP_BUG_SERIAL) {
        std::cmp::Ordering::Equal => Some("1900-02-29".to_string()),
        std::cmp::Ordering::Less => {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 31)?;
            epoch.checked_add_signed(Duration::days(days)).map(format_date)
        }
        std::cmp::Ordering::Greater => {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            epoch.checked_add_signed(Duration::days(days)).map(format_date)
        }
    }
}

/// Reorder a delimited date string into `YYYY-MM-DD`.
pub fn text_to_iso(text: &str) -> Option<String> {
    let cleaned = DATE_NOISE.replace_all(text, "");
    let tokens: Vec<&str> = cleaned.split(['-', '/']).collect();
    let [first, middle, last] = tokens.as_slice() else {
        return None;
    };
    if tokens.iter().any(|t| t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    if last.len() == 4 {
        Some(format!("{}-{}-{}", last, pad2(middle), pad2(first)))
    } else if first.len() == 4 {
        Some(format!("{}-{}-{}", first, pad2(middle), pad2(last)))
    } else {
        None
    }
}

fn pad2(token: &str) -> String {
    format!("{:0>2}", token)
}
