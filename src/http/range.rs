//! HTTP Range request parsing module
//!
//! Single byte-range requests (RFC 7233) against a stored image.

/// Inclusive byte range resolved against a known length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` header value
    pub fn content_range(&self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Serve the given slice with 206
    Valid(ByteRange),
    /// Nothing in the resource overlaps the request - 416
    NotSatisfiable,
    /// No Range header, or one we ignore - serve the full body
    None,
}

/// Parse a `Range` header for a resource of `len` bytes
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
/// Multi-range requests and other units are ignored.
///
/// # Examples
/// ```
/// use imghost::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-9"), 50);
/// assert_eq!(result, RangeParseResult::Valid(ByteRange { start: 0, end: 9 }));
/// assert_eq!(parse_range_header(None, 50), RangeParseResult::None);
/// ```
pub fn parse_range_header(header: Option<&str>, len: usize) -> RangeParseResult {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };

    if spec.contains(',') {
        return RangeParseResult::None;
    }

    let Some((first, last)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // Suffix form: last N bytes
        return match last.parse::<usize>() {
            Ok(0) => RangeParseResult::NotSatisfiable,
            Ok(_) if len == 0 => RangeParseResult::NotSatisfiable,
            Ok(n) => RangeParseResult::Valid(ByteRange {
                start: len.saturating_sub(n),
                end: len - 1,
            }),
            Err(_) => RangeParseResult::None,
        };
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if start >= len {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if last.is_empty() {
        len - 1
    } else {
        match last.parse::<usize>() {
            Ok(e) if e < start => return RangeParseResult::NotSatisfiable,
            Ok(e) => e.min(len - 1),
            Err(_) => return RangeParseResult::None,
        }
    };

    RangeParseResult::Valid(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(start: usize, end: usize) -> RangeParseResult {
        RangeParseResult::Valid(ByteRange { start, end })
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeParseResult::None);
        assert_eq!(parse_range_header(Some("items=0-1"), 100), RangeParseResult::None);
    }

    #[test]
    fn test_closed_and_open_ranges() {
        assert_eq!(parse_range_header(Some("bytes=0-9"), 100), valid(0, 9));
        assert_eq!(parse_range_header(Some("bytes=50-"), 100), valid(50, 99));
        assert_eq!(parse_range_header(Some("bytes=90-500"), 100), valid(90, 99));
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(parse_range_header(Some("bytes=-20"), 100), valid(80, 99));
        assert_eq!(parse_range_header(Some("bytes=-500"), 100), valid(0, 99));
    }

    #[test]
    fn test_not_satisfiable() {
        let cases = ["bytes=200-", "bytes=-0", "bytes=9-3"];
        for case in cases {
            assert_eq!(
                parse_range_header(Some(case), 100),
                RangeParseResult::NotSatisfiable,
                "{case}"
            );
        }
        assert_eq!(
            parse_range_header(Some("bytes=-5"), 0),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_ignored_forms() {
        assert_eq!(parse_range_header(Some("bytes=a-b"), 100), RangeParseResult::None);
        assert_eq!(
            parse_range_header(Some("bytes=0-9,20-29"), 100),
            RangeParseResult::None
        );
        assert_eq!(parse_range_header(Some("bytes=5"), 100), RangeParseResult::None);
    }

    #[test]
    fn test_content_range() {
        let range = ByteRange { start: 10, end: 19 };
        assert_eq!(range.len(), 10);
        assert_eq!(range.content_range(50), "bytes 10-19/50");
    }
}
