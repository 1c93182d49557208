//! HTTP cache validation module
//!
//! `ETag` and `Last-Modified` validators for stored images. Records never
//! change once written, so size plus modification time identifies content.

use chrono::{DateTime, TimeZone, Utc};

/// Build a quoted `ETag` from record size and modification time
pub fn generate_etag<Tz: TimeZone>(size: u64, modified: &DateTime<Tz>) -> String {
    format!("\"{:x}-{:x}\"", size, modified.timestamp_micros())
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports single, comma-separated and wildcard values.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || e.strip_prefix("W/").unwrap_or(e) == etag
        })
    })
}

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn http_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    at.with_timezone(&Utc)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// True when `If-Modified-Since` is at or after the resource's last
/// modification, compared at whole-second precision
pub fn not_modified_since<Tz: TimeZone>(
    if_modified_since: Option<&str>,
    last_modified: &DateTime<Tz>,
) -> bool {
    let Some(since) = if_modified_since.and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
    else {
        return false;
    };
    last_modified.timestamp() <= since.timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_generate_etag() {
        let t = at("2024-03-01T10:00:00Z");
        let etag = generate_etag(50, &t);
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_eq!(etag, generate_etag(50, &t));
        assert_ne!(etag, generate_etag(51, &t));
        assert_ne!(etag, generate_etag(50, &at("2024-03-01T10:00:01Z")));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"32-abc\"";
        assert!(check_etag_match(Some("\"32-abc\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"32-abc\""), etag));
        assert!(check_etag_match(Some("W/\"32-abc\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_http_date() {
        assert_eq!(
            http_date(&at("1994-11-06T08:49:37Z")),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }

    #[test]
    fn test_not_modified_since() {
        let modified = at("2024-03-01T10:00:00.750Z");
        assert!(not_modified_since(Some("Fri, 01 Mar 2024 10:00:00 GMT"), &modified));
        assert!(not_modified_since(Some("Sat, 02 Mar 2024 00:00:00 GMT"), &modified));
        assert!(!not_modified_since(Some("Fri, 01 Mar 2024 09:59:59 GMT"), &modified));
        assert!(!not_modified_since(Some("yesterday"), &modified));
        assert!(!not_modified_since(None, &modified));
    }
}
