// 🧹 Field Normalizers - raw CSV text → canonical values
// Dates, amounts, categories and transaction types.
//
// None of these fail: bad input degrades to a best-effort value
// (verbatim date text, amount 0, "Uncategorized", expense).

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::parser::TransactionType;

/// Category used when the source has none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Type values (lower-cased, trimmed) that mean money coming in.
pub const INCOME_KEYWORDS: &[&str] = &["income", "credit", "deposit", "salary", "earning"];

// ============================================================================
// DATES
// ============================================================================

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid ISO date regex"));

static SLASH_DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})$").expect("valid slash date regex")
});

static DASH_DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{2})-([0-9]{2})-([0-9]{4})$").expect("valid dash date regex")
});

/// Date-time layouts tried by the generic fallback (date part is kept).
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%b %d %Y %H:%M:%S",
    "%b %d %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
];

/// Date-only layouts tried by the generic fallback.
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%Y.%m.%d",
    "%d-%b-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%a %B %d %Y",
    "%a, %B %d, %Y",
];

/// Two-digit-year layouts. Slashed short dates read month first here.
const SHORT_YEAR_FORMATS: &[&str] = &["%m/%d/%y", "%y-%m-%d", "%d-%b-%y"];

/// Lowest year a `%Y` layout may yield (`%Y` also accepts 1-3 digits).
const MIN_YEAR: i32 = 1000;

/// Two-digit years at or above this map to the 1900s instead of the 2000s.
const SHORT_YEAR_PIVOT: i32 = 2050;

/// Normalize a date cell to `YYYY-MM-DD`.
///
/// Recognized, in order:
/// 1. `2026-01-02` (passed through)
/// 2. `2/1/2026`, `02/01/2026` (day first)
/// 3. `02-01-2026` (day first)
/// 4. anything [`parse_calendar_date`] understands, first on the full
///    string and then on the date part alone
///
/// A time-of-day suffix after the first whitespace run is ignored. When
/// nothing matches, the date-only part is returned verbatim.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let date_part = trimmed.split_whitespace().next().unwrap_or("");

    if ISO_DATE.is_match(date_part) {
        return date_part.to_string();
    }

    if let Some(caps) = SLASH_DAY_FIRST.captures(date_part) {
        return format!("{}-{:0>2}-{:0>2}", &caps[3], &caps[2], &caps[1]);
    }

    if let Some(caps) = DASH_DAY_FIRST.captures(date_part) {
        return format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]);
    }

    if let Some(date) = parse_calendar_date(trimmed).or_else(|| parse_calendar_date(date_part)) {
        return date.format("%Y-%m-%d").to_string();
    }

    if date_part.is_empty() {
        trimmed.to_string()
    } else {
        date_part.to_string()
    }
}

/// Generic calendar parse used as the last resort of [`normalize_date`].
///
/// Zoned timestamps are converted to the local calendar day.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Local).date_naive());
    }

    let plausible = |date: NaiveDate| (date.year() >= MIN_YEAR).then_some(date);

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok().and_then(|dt| plausible(dt.date())))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok().and_then(plausible))
        })
        .or_else(|| {
            SHORT_YEAR_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|date| {
                    if date.year() >= SHORT_YEAR_PIVOT {
                        date.with_year(date.year() - 100)
                    } else {
                        Some(date)
                    }
                })
        })
}

// ============================================================================
// AMOUNTS
// ============================================================================

/// Normalize a textual amount to a non-negative number.
///
/// Everything except digits, `.` and `-` is dropped (currency symbols,
/// thousands separators, spaces), then the longest leading number is parsed.
/// Unparseable input becomes `0`. The sign is always discarded: direction
/// comes from the type column.
pub fn normalize_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    normalize_amount_value(leading_float(&cleaned).unwrap_or(0.0))
}

/// Normalize an amount that is already numeric.
pub fn normalize_amount_value(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.abs()
    }
}

/// Parse the longest prefix of `s` that reads as a decimal number
/// (optional leading `-`, digits, at most one `.`).
fn leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    let mut seen_digit = false;
    let mut seen_dot = false;

    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

// ============================================================================
// CATEGORIES
// ============================================================================

/// Normalize a category so "food", " FOOD " and "Food" all read "Food".
///
/// Whitespace runs collapse to one space; blank becomes
/// [`UNCATEGORIZED`]; otherwise the text is lower-cased and the first
/// ASCII letter or digit of every word is upper-cased.
pub fn normalize_category(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return UNCATEGORIZED.to_string();
    }

    let mut out = String::with_capacity(collapsed.len());
    let mut prev_is_word = false;
    for c in collapsed.to_lowercase().chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }
    out
}

// ============================================================================
// TYPES
// ============================================================================

/// Infer the transaction direction from a type cell.
pub fn normalize_type(raw: &str) -> TransactionType {
    let lowered = raw.trim().to_lowercase();
    if INCOME_KEYWORDS.contains(&lowered.as_str()) {
        TransactionType::Income
    } else {
        TransactionType::Expense
    }
}

// ============================================================================
// TESTS
// ============================================================================
