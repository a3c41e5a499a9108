pub mod application;
pub mod student;

use chrono::NaiveDate;

// counts characters, not bytes
pub fn clip(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
        .or_else(|| chrono::DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clip_counts_characters() {
        assert_eq!(clip("abcdef", 4), "abcd");
        assert_eq!(clip("abc", 10), "abc");
        assert_eq!(clip("日本語テスト", 3), "日本語");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_date("2024-05-06"), Some(expected));
        assert_eq!(parse_date("05/06/2024"), Some(expected));
        assert_eq!(parse_date("2024-05-06T10:30:00Z"), Some(expected));
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
    }
}
