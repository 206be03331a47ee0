use chrono::NaiveDate;
use std::path::PathBuf;

/// Get the data directory from environment variable or use default
pub fn get_data_dir() -> PathBuf {
    std::env::var("STOCKPULSE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Get the per-symbol cache root (`<data_dir>/cache`)
pub fn get_cache_dir() -> PathBuf {
    get_data_dir().join("cache")
}

/// Format a date as YYYY-MM-DD
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a YYYY-MM-DD date string
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date(" 2024-03-15 "), NaiveDate::from_ymd_opt(2024, 3, 15));
    }
}
