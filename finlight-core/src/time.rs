//! Date helpers: month scoping and human-readable dates.

use chrono::{NaiveDate, Utc};

/// Current UTC month as `YYYY-MM`.
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

/// Current UTC date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// True when the ISO form of `date` starts with `month`.
///
/// This is a plain prefix match, so a month of `2024` selects the whole year
/// and an empty month selects everything.
pub fn in_month(date: NaiveDate, month: &str) -> bool {
    date.format("%Y-%m-%d").to_string().starts_with(month)
}

/// `DD.MM.YY`, as used in exports and tables.
pub fn format_date_human(date: NaiveDate) -> String {
    date.format("%d.%m.%y").to_string()
}

/// Parse a `YYYY-MM` month; returns `None` for anything else.
pub fn parse_month(month: &str) -> Option<(i32, u32)> {
    let (y, m) = month.split_once('-')?;
    if y.len() != 4 || m.len() != 2 {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let mon: u32 = m.parse().ok()?;
    NaiveDate::from_ymd_opt(year, mon, 1).map(|_| (year, mon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_in_month_prefix() {
        assert!(in_month(d(2024, 3, 5), "2024-03"));
        assert!(!in_month(d(2024, 4, 5), "2024-03"));
        assert!(in_month(d(2024, 11, 30), "2024"));
        assert!(in_month(d(2024, 3, 5), ""));
    }

    #[test]
    fn test_format_date_human() {
        assert_eq!(format_date_human(d(2024, 3, 5)), "05.03.24");
        assert_eq!(format_date_human(d(1999, 12, 31)), "31.12.99");
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-03"), Some((2024, 3)));
        assert_eq!(parse_month("2024-13"), None);
        assert_eq!(parse_month("2024-3"), None);
        assert_eq!(parse_month("march"), None);
    }
}
