//! Form input validation.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("Invalid email regex")
});

static PHONE_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-()]").expect("Invalid phone noise regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("Invalid phone regex"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-ZÀ-ÿ\s'\-]+$").expect("Invalid name regex"));

// Belgian plates: 1-ABC-123 and variations
static PLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9A-Z]{1,3}[-\s]?[A-Z]{3}[-\s]?[0-9]{3}$").expect("Invalid plate regex")
});

static VAT_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.\-]").expect("Invalid VAT noise regex"));

static VAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9A-Z]{2,12}$").expect("Invalid VAT regex"));

/// Earliest accepted vehicle year.
pub const MIN_YEAR: i32 = 1900;

pub fn email(input: &str) -> bool {
    EMAIL_RE.is_match(input)
}

/// International phone number: optional `+`, then 7 to 15 digits once
/// spaces, dashes and parentheses are removed.
pub fn phone(input: &str) -> bool {
    PHONE_RE.is_match(&PHONE_NOISE_RE.replace_all(input, ""))
}

/// Letters (accented Latin included), spaces, apostrophes and hyphens.
pub fn name(input: &str) -> bool {
    !input.trim().is_empty() && NAME_RE.is_match(input)
}

pub fn license_plate(input: &str) -> bool {
    PLATE_RE.is_match(input.trim())
}

/// EU VAT number shape: country code then 2 to 12 alphanumerics.
pub fn vat_format(input: &str) -> bool {
    VAT_RE.is_match(&VAT_NOISE_RE.replace_all(input, ""))
}

/// Keep only digits, dots and minus signs.
pub fn sanitize_numeric(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

/// A year between [`MIN_YEAR`] and next year.
pub fn year(input: &str, current_year: i32) -> bool {
    match input.trim().parse::<i32>() {
        Ok(y) => (MIN_YEAR..=current_year + 1).contains(&y),
        Err(_) => false,
    }
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Whether `date` (`YYYY-MM-DD`) and optional `time` (`HH:MM`) are not in
/// the past relative to `now`. Without a time, midnight is assumed.
pub fn future_date(date: &str, time: Option<&str>, now: NaiveDateTime) -> bool {
    let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
        return false;
    };

    let at = match time.filter(|t| !t.is_empty()) {
        Some(t) => match NaiveTime::parse_from_str(t, "%H:%M") {
            Ok(t) => t,
            Err(_) => return false,
        },
        None => NaiveTime::MIN,
    };

    day.and_time(at) >= now
}
