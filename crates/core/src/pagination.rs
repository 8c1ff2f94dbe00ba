//! Cursor pagination.
//!
//! Listings are ordered by ID descending and continued with the last ID seen
//! on the previous page. IDs are assigned monotonically by the database, so
//! "strictly less than the cursor" continues the listing without gaps.
//!
//! `has_more` is inferred from a full page rather than verified by fetching
//! one extra row. When the result set ends exactly on a page boundary the
//! caller gets one extra, empty page. That false positive is accepted.

use serde::{Deserialize, Serialize};

use crate::models::Product;

/// Page size used when the caller does not ask for a positive one.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Anything listed through cursor pagination.
pub trait Identifiable {
    /// The integer ID used as the continuation token.
    fn cursor_id(&self) -> i32;
}

impl Identifiable for Product {
    fn cursor_id(&self) -> i32 {
        self.id.as_i32()
    }
}

/// Continuation metadata for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorPagination {
    /// Cursor for the next page, `0` when there is none.
    pub next_cursor: i32,
    /// Whether another page is expected.
    pub has_more: bool,
}

/// A page of items plus its continuation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: i32,
    pub has_more: bool,
}

impl<T: Identifiable> Page<T> {
    /// Wrap a fetched page, computing its continuation metadata.
    #[must_use]
    pub fn from_items(items: Vec<T>, limit: i64) -> Self {
        let CursorPagination {
            next_cursor,
            has_more,
        } = build_cursor_pagination(&items, limit);
        Self {
            items,
            next_cursor,
            has_more,
        }
    }
}

/// Compute the next cursor for a page fetched with `limit`.
///
/// A non-empty page holding exactly `limit` items yields the ID of its last
/// item and `has_more = true`. Anything shorter, including an empty page and
/// a zero limit, yields `(0, false)`.
#[must_use]
pub fn build_cursor_pagination<T: Identifiable>(items: &[T], limit: i64) -> CursorPagination {
    let Some(last) = items.last() else {
        return CursorPagination::default();
    };

    let full_page = i64::try_from(items.len()).is_ok_and(|len| len == limit);
    if full_page {
        CursorPagination {
            next_cursor: last.cursor_id(),
            has_more: true,
        }
    } else {
        CursorPagination::default()
    }
}

/// Clamp a requested page size into `1..=MAX_PAGE_LIMIT`.
///
/// Non-positive requests fall back to [`DEFAULT_PAGE_LIMIT`].
#[must_use]
pub const fn clamp_limit(limit: i64) -> i64 {
    if limit <= 0 {
        DEFAULT_PAGE_LIMIT
    } else if limit > MAX_PAGE_LIMIT {
        MAX_PAGE_LIMIT
    } else {
        limit
    }
}
