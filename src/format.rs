//! Display formatting for purchase order fields
//!
//! Every function here is total: malformed or absent input degrades to a
//! visible placeholder instead of failing, so a bad field can never break
//! the list table or the printed document.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Placeholder for absent or zero numeric values
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for absent text and counts
pub const EMPTY_CELL: &str = "-";

/// Currency symbol for Indian rupees
const CURRENCY_SYMBOL: &str = "₹";

/// Format a raw date string as `DD MMM YYYY`.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive ISO timestamps.
/// Anything else is returned unchanged.
///
/// # Examples
///
/// ```
/// use purchase_order_sdk::format::format_date;
///
/// assert_eq!(format_date("2024-03-05"), "05 Mar 2024");
/// assert_eq!(format_date("2024-03-05T18:45:00Z"), "05 Mar 2024");
/// assert_eq!(format_date("next tuesday"), "next tuesday");
/// ```
pub fn format_date(raw: &str) -> String {
    match parse_date(raw.trim()) {
        Some(date) => format_calendar_date(date),
        None => raw.to_string(),
    }
}

/// Format a calendar date as `DD MMM YYYY`
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|timestamp| timestamp.date())
}

/// Format an amount as Indian rupees, or `N/A` when absent or not positive.
///
/// Uses Indian digit grouping (thousands, then groups of two) and always
/// two decimals. Zero is indistinguishable from "unset" and also renders
/// as `N/A`.
///
/// # Examples
///
/// ```
/// use purchase_order_sdk::format::format_currency;
///
/// assert_eq!(format_currency(Some(123456.5)), "₹1,23,456.50");
/// assert_eq!(format_currency(Some(0.0)), "N/A");
/// assert_eq!(format_currency(None), "N/A");
/// ```
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => {
            let fixed = format!("{:.2}", v);
            let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
            format!("{}{}.{}", CURRENCY_SYMBOL, group_indian(whole), fraction)
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Insert Indian-style separators into a string of digits
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Format a weight as `"<value> kg"`, or `N/A` when absent or zero.
///
/// # Examples
///
/// ```
/// use purchase_order_sdk::format::format_weight;
///
/// assert_eq!(format_weight(Some(1250.5)), "1250.5 kg");
/// assert_eq!(format_weight(Some(40.0)), "40 kg");
/// assert_eq!(format_weight(Some(0.0)), "N/A");
/// ```
pub fn format_weight(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => format!("{} kg", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Format a bag count, or `-` when absent or zero
pub fn format_bags(value: Option<u32>) -> String {
    match value {
        Some(bags) if bags > 0 => bags.to_string(),
        _ => EMPTY_CELL.to_string(),
    }
}

/// Format optional free text, or `-` when absent or blank
pub fn format_text(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => EMPTY_CELL.to_string(),
    }
}
