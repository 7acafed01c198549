//! Publication-date parsing and the inclusive fetch window.

use chrono::{DateTime, Duration, NaiveDate};
use serde_json::Value;

/// Inclusive `[start, end]` range of publication dates a digest looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// The `days` most recent days ending on `today`. Zero days still covers today.
    pub fn ending(today: NaiveDate, days: u32) -> Self {
        let back = i64::from(days.saturating_sub(1));
        Self { start: today - Duration::days(back), end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Parse the date formats seen in feeds and APIs: `%Y-%m-%d`, `%Y/%m/%d`,
/// `%Y-%m`, `%Y/%m`, `%Y`, RFC 2822 and RFC 3339.
pub fn parse_pub_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }
    // chrono needs a day to build a date
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        let padded = if fmt.contains('-') { format!("{value}-01") } else { format!("{value}/01") };
        if let Ok(date) = NaiveDate::parse_from_str(&padded, fmt) {
            return Some(date);
        }
    }
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = value.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    None
}

/// CrossRef style `[year, month?, day?]`; missing parts default to 1.
pub fn date_from_parts(parts: &[Value]) -> Option<NaiveDate> {
    let year = parts.first()?.as_i64()?;
    let month = parts.get(1).and_then(Value::as_u64).unwrap_or(1);
    let day = parts.get(2).and_then(Value::as_u64).unwrap_or(1);
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Month as a number or an English name/abbreviation (`Sept` included).
pub fn parse_month(text: &str) -> u32 {
    let text = text.trim();
    if let Ok(n) = text.parse::<u32>() {
        return n;
    }
    let prefix: String = text.chars().take(3).collect::<String>().to_lowercase();
    match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _     => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_window_is_inclusive() {
        let w = FetchWindow::ending(d(2024, 6, 10), 7);
        assert_eq!(w.start, d(2024, 6, 4));
        assert!(w.contains(d(2024, 6, 4)));
        assert!(w.contains(d(2024, 6, 10)));
        assert!(!w.contains(d(2024, 6, 3)));
        assert!(!w.contains(d(2024, 6, 11)));
    }

    #[test]
    fn test_zero_day_window_covers_today() {
        let w = FetchWindow::ending(d(2024, 6, 10), 0);
        assert_eq!(w.start, w.end);
    }

    #[test]
    fn test_parse_pub_date_formats() {
        assert_eq!(parse_pub_date("2024-06-03"), Some(d(2024, 6, 3)));
        assert_eq!(parse_pub_date("2024/06/03"), Some(d(2024, 6, 3)));
        assert_eq!(parse_pub_date("2024-06"), Some(d(2024, 6, 1)));
        assert_eq!(parse_pub_date("2024"), Some(d(2024, 1, 1)));
        assert_eq!(parse_pub_date("Mon, 03 Jun 2024 09:30:00 +0000"), Some(d(2024, 6, 3)));
        assert_eq!(parse_pub_date("2024-06-03T22:15:00-04:00"), Some(d(2024, 6, 3)));
        assert_eq!(parse_pub_date("next tuesday"), None);
        assert_eq!(parse_pub_date(""), None);
    }

    #[test]
    fn test_date_from_parts() {
        assert_eq!(date_from_parts(&[json!(2024), json!(6), json!(3)]), Some(d(2024, 6, 3)));
        assert_eq!(date_from_parts(&[json!(2024)]), Some(d(2024, 1, 1)));
        assert_eq!(date_from_parts(&[json!(2024), json!(2), json!(30)]), None);
        assert_eq!(date_from_parts(&[]), None);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("06"), 6);
        assert_eq!(parse_month("Sept"), 9);
        assert_eq!(parse_month("december"), 12);
        assert_eq!(parse_month("Spring"), 1);
    }
}
