//! Pagination utilities
//!
//! Page numbers are 1-indexed. `offset = limit * (page - 1)`.

use songlib_common::{Error, Result};
use std::ops::Range;

/// Default page size for song listings
pub const DEFAULT_SONG_LIMIT: i64 = 10;

/// Default page size for verse listings
pub const DEFAULT_VERSE_LIMIT: i64 = 5;

/// Sanitized page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// Current page number (>= 1)
    pub page: i64,
    /// Page size (>= 0)
    pub limit: i64,
}

impl PageParams {
    /// Clamp `page` to at least 1 and `limit` to at least 0
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(0),
        }
    }

    /// Parse raw query-string values.
    ///
    /// Absent or empty values take the defaults (page 1, `default_limit`).
    /// Non-numeric values are an `InvalidInput` error.
    ///
    /// # Examples
    /// ```
    /// use songlib_srv::pagination::PageParams;
    ///
    /// let p = PageParams::parse(Some("3"), None, 10).unwrap();
    /// assert_eq!(p.page, 3);
    /// assert_eq!(p.limit, 10);
    /// assert_eq!(p.offset(), 20);
    ///
    /// assert!(PageParams::parse(Some("abc"), None, 10).is_err());
    /// ```
    pub fn parse(page: Option<&str>, limit: Option<&str>, default_limit: i64) -> Result<Self> {
        let page = parse_number("page", page)?.unwrap_or(1);
        let limit = parse_number("limit", limit)?.unwrap_or(default_limit);
        Ok(Self::new(page, limit))
    }

    /// Offset for SQL LIMIT/OFFSET query
    pub fn offset(&self) -> i64 {
        self.limit.saturating_mul(self.page - 1)
    }

    /// Index range of this page within `total` items, clamped to `[0, total]`
    pub fn slice_bounds(&self, total: usize) -> Range<usize> {
        let total_i = i64::try_from(total).unwrap_or(i64::MAX);
        let start = self.offset().min(total_i);
        let end = start.saturating_add(self.limit).min(total_i);
        // both values are within [0, total] here
        (start as usize)..(end as usize)
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| Error::InvalidInput(format!("Invalid {} value: '{}'", name, value))),
    }
}
