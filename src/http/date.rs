//! HTTP date module
//!
//! Parses the three date formats RFC 2616 §3.3.1 allows and formats the
//! preferred RFC 1123 form.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// RFC 850 (`Sunday, 06-Nov-94 08:49:37 GMT`)
const RFC850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// ANSI C `asctime()` (`Sun Nov  6 08:49:37 1994`)
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";
/// RFC 1123 output format
const IMF_FIXDATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Parse an HTTP date, `None` if it is not one
///
/// # Examples
/// ```
/// use yarhs_conditional::http::date::{format_http_date, parse_http_date};
///
/// let date = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
/// assert_eq!(format_http_date(&date), "Sun, 06 Nov 1994 08:49:37 GMT");
/// assert!(parse_http_date("yesterday").is_none());
/// ```
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    [RFC850_FORMAT, ASCTIME_FORMAT]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Format a date the way HTTP headers carry it
pub fn format_http_date(date: &DateTime<Utc>) -> String {
    date.format(IMF_FIXDATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap()
    }

    #[test]
    fn test_rfc1123() {
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(reference()));
    }

    #[test]
    fn test_rfc850() {
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(reference()));
    }

    #[test]
    fn test_asctime() {
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(reference()));
    }

    #[test]
    fn test_invalid() {
        assert_eq!(parse_http_date(""), None);
        assert_eq!(parse_http_date("not a date GMT"), None);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_http_date(&reference()), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
