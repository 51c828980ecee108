//! PDF date strings (`D:YYYYMMDDHHmmSSOHH'mm'`)

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Parse a PDF timestamp into a date-time.
///
/// The string is turned into ISO 8601 by inserting separators at fixed
/// positions (`YYYY-MM-DDTHH:mm:SS+HH:mm`) and then parsed. A missing UTC
/// offset is read as UTC. Short or malformed strings yield `None`; no
/// default date is ever substituted.
pub fn parse_pdf_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    let text = text.strip_prefix("D:").unwrap_or(text);

    // Positional insertion below only makes sense on the 14 leading digits.
    let digits = text.get(..14)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut iso = String::with_capacity(text.len() + 6);
    iso.push_str(&digits[0..4]);
    iso.push('-');
    iso.push_str(&digits[4..6]);
    iso.push('-');
    iso.push_str(&digits[6..8]);
    iso.push('T');
    iso.push_str(&digits[8..10]);
    iso.push(':');
    iso.push_str(&digits[10..12]);
    iso.push(':');
    iso.push_str(&digits[12..14]);

    let mut zone = text[14..].replace('\'', ":");
    if zone.ends_with(':') {
        zone.pop();
    }

    if zone.is_empty() {
        let naive = NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S").ok()?;
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }

    iso.push_str(&zone);
    DateTime::parse_from_rfc3339(&iso).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_with_offset() {
        let date = parse_pdf_date("D:20190612093015+05'30'").unwrap();
        assert_eq!(date.year(), 2019);
        assert_eq!(date.month(), 6);
        assert_eq!(date.day(), 12);
        assert_eq!(date.hour(), 9);
        assert_eq!(date.minute(), 30);
        assert_eq!(date.second(), 15);
        assert_eq!(date.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn test_parse_utc_marker() {
        let date = parse_pdf_date("D:20200101000000Z").unwrap();
        assert_eq!(date.offset().local_minus_utc(), 0);
        assert_eq!(date.year(), 2020);
    }

    #[test]
    fn test_parse_without_offset() {
        let date = parse_pdf_date("D:19991231235959").unwrap();
        assert_eq!(date.year(), 1999);
        assert_eq!(date.second(), 59);
        assert_eq!(date.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_negative_offset_without_prefix() {
        let date = parse_pdf_date("20210315080000-08'00").unwrap();
        assert_eq!(date.offset().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn test_malformed_dates() {
        assert!(parse_pdf_date("").is_none());
        assert!(parse_pdf_date("D:2019").is_none());
        assert!(parse_pdf_date("D:2019AB12093015").is_none());
        assert!(parse_pdf_date("D:20191312093015").is_none());
        assert!(parse_pdf_date("D:20190612093015+5").is_none());
        assert!(parse_pdf_date("D:201906120930ü5").is_none());
    }
}
