// SPDX-License-Identifier: MIT

//! HTTP byte-range parsing (spec.md §4.5.1). Only single-range `bytes=`
//! specs are supported, which is all the download handler ever advertises.

use hearth_core::{Error, Result};

/// An inclusive byte range resolved against a known total size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ContentRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Render the `Content-Range` header value.
    pub fn header_value(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Parse a `Range` header value of the form `bytes=start-end`, `bytes=start-`
/// (open-ended, streams to end-of-file) or `bytes=-suffix_len` (last N
/// bytes), resolving it against `total` bytes.
pub fn parse_range(header: &str, total: u64) -> Result<ContentRange> {
    let spec = header
        .strip_prefix("bytes=")
        .ok_or_else(|| Error::Validation(format!("unsupported range unit: {header}")))?;

    // Only a single range is supported.
    let spec = spec.split(',').next().unwrap_or("").trim();
    let (start_str, end_str) = spec
        .split_once('-')
        .ok_or_else(|| Error::Validation(format!("malformed range: {header}")))?;

    if start_str.is_empty() {
        // Suffix range: last N bytes.
        let suffix_len: u64 = end_str
            .parse()
            .map_err(|_| Error::Validation(format!("malformed range: {header}")))?;
        if suffix_len == 0 || total == 0 {
            return Err(Error::Validation("empty suffix range".into()));
        }
        let start = total.saturating_sub(suffix_len);
        return Ok(ContentRange { start, end: total - 1, total });
    }

    let start: u64 = start_str
        .parse()
        .map_err(|_| Error::Validation(format!("malformed range: {header}")))?;
    if start >= total {
        return Err(Error::Validation(format!("range start {start} beyond end of file")));
    }

    let end = if end_str.is_empty() {
        total.saturating_sub(1)
    } else {
        let requested: u64 = end_str
            .parse()
            .map_err(|_| Error::Validation(format!("malformed range: {header}")))?;
        requested.min(total.saturating_sub(1))
    };

    if end < start {
        return Err(Error::Validation(format!("malformed range: {header}")));
    }

    Ok(ContentRange { start, end, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bounded_range() {
        let r = parse_range("bytes=10-20", 100).unwrap();
        assert_eq!(r, ContentRange { start: 10, end: 20, total: 100 });
        assert_eq!(r.len(), 11);
    }

    #[test]
    fn parses_open_ended_range() {
        let r = parse_range("bytes=50-", 100).unwrap();
        assert_eq!(r, ContentRange { start: 50, end: 99, total: 100 });
    }

    #[test]
    fn parses_suffix_range() {
        let r = parse_range("bytes=-10", 100).unwrap();
        assert_eq!(r, ContentRange { start: 90, end: 99, total: 100 });
    }

    #[test]
    fn clamps_end_beyond_total() {
        let r = parse_range("bytes=0-1000", 100).unwrap();
        assert_eq!(r.end, 99);
    }

    #[test]
    fn rejects_start_past_end_of_file() {
        assert!(parse_range("bytes=500-600", 100).is_err());
    }

    #[test]
    fn rejects_malformed_unit() {
        assert!(parse_range("items=0-1", 100).is_err());
    }
}
