//! Date/time normalization for spreadsheet text.
//!
//! Roster cells are typed by hand, so the same slot shows up as `9:00`,
//! `09:00` or `09:00:00`, and dates as `5/12`, `05/12/2025` or an ISO string.
//! Everything is brought to `dd/mm/yyyy` and `HH:mm`; input that matches no
//! known shape is returned trimmed but otherwise untouched.

use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

/// Weekday names indexed from Sunday.
pub const WEEKDAYS_PT_BR: [&str; 7] = [
    "Domingo",
    "Segunda-feira",
    "Terça-feira",
    "Quarta-feira",
    "Quinta-feira",
    "Sexta-feira",
    "Sábado",
];

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn full_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^(\d{1,2})/(\d{1,2})/(\d{4})(?:\s+.*)?$")
}

fn short_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^(\d{1,2})/(\d{1,2})$")
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^(\d{4})-(\d{2})-(\d{2})(?:[T\s].*)?$")
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^(\d{1,2}):(\d{2})(?::\d{2}(?:\.\d+)?)?$")
}

fn hour_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^(\d{1,2})\s*[hH]\s*(\d{2})?$")
}

fn embedded_clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"[T\s](\d{1,2}):(\d{2})(?::\d{2})?")
}

fn day_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(\d{1,2})/(\d{1,2})")
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Canonical `dd/mm/yyyy`; `dd/mm` takes the current year.
pub fn normalize_date(raw: &str) -> String {
    normalize_date_in_year(raw, current_year())
}

/// Canonical `dd/mm/yyyy`, completing `dd/mm` with `year`.
pub fn normalize_date_in_year(raw: &str, year: i32) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    if let Some(caps) = full_date_re().captures(text) {
        return format!("{:0>2}/{:0>2}/{}", &caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = short_date_re().captures(text) {
        return format!("{:0>2}/{:0>2}/{}", &caps[1], &caps[2], year);
    }

    if let Some(caps) = iso_date_re().captures(text) {
        return format!("{}/{}/{}", &caps[3], &caps[2], &caps[1]);
    }

    text.to_string()
}

/// Canonical `HH:mm`.
pub fn normalize_time(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    if let Some(caps) = clock_re().captures(text) {
        return format!("{:0>2}:{}", &caps[1], &caps[2]);
    }

    if let Some(caps) = hour_suffix_re().captures(text) {
        let minutes = caps.get(2).map(|m| m.as_str()).unwrap_or("00");
        return format!("{:0>2}:{}", &caps[1], minutes);
    }

    // Date-time renderings such as "30/12/1899 09:00:00" or "2025-12-12T09:00"
    if let Some(caps) = embedded_clock_re().captures(text) {
        return format!("{:0>2}:{}", &caps[1], &caps[2]);
    }

    text.to_string()
}

fn strip_leading_zeros(part: &str) -> &str {
    let stripped = part.trim_start_matches('0');
    if stripped.is_empty() && !part.is_empty() {
        "0"
    } else {
        stripped
    }
}

fn date_key(raw: &str) -> String {
    let normalized = normalize_date(raw);
    let parts: Vec<&str> = normalized.split('/').collect();
    if parts.len() != 3 {
        return normalized;
    }
    format!(
        "{}/{}/{}",
        strip_leading_zeros(parts[0]),
        strip_leading_zeros(parts[1]),
        parts[2]
    )
}

fn time_key(raw: &str) -> String {
    let normalized = normalize_time(raw);
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() != 2 {
        return normalized;
    }
    format!("{}:{}", strip_leading_zeros(parts[0]), strip_leading_zeros(parts[1]))
}

/// `5/12/2025` equals `05/12/2025`. Blank never equals anything.
pub fn dates_equal(a: &str, b: &str) -> bool {
    if a.trim().is_empty() || b.trim().is_empty() {
        return false;
    }
    date_key(a) == date_key(b)
}

/// `9:00` equals `09:00`. Blank never equals anything.
pub fn times_equal(a: &str, b: &str) -> bool {
    if a.trim().is_empty() || b.trim().is_empty() {
        return false;
    }
    time_key(a) == time_key(b)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&normalize_date(raw), "%d/%m/%Y").ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(&normalize_time(raw), "%H:%M").ok()
}

/// First `d/m` pair found anywhere in the text, without leading zeros.
pub fn day_month(raw: &str) -> Option<(u32, u32)> {
    let caps = day_month_re().captures(raw)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS_PT_BR[date.weekday().num_days_from_sunday() as usize]
}

/// Monday and Friday of the week containing `date`. Weekend dates map to
/// the week that just ended.
pub fn work_week(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = date.weekday().num_days_from_monday() as i64;
    let monday = date - chrono::Duration::days(offset);
    let friday = monday + chrono::Duration::days(4);
    debug_assert_eq!(friday.weekday(), Weekday::Fri);
    (monday, friday)
}
