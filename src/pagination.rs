//! Page arithmetic.
//!
//! Everything here is pure integer math: no floating point, no state.
//!
//! ## Numbering
//!
//! Page indices are 0-based internally and 1-based for display. For index
//! `i` of `all` pages:
//!
//! ```text
//! current = i + 1
//! prev    = i        (0 on the first page  → "no previous page")
//! next    = i + 2    (all + 1 on the last  → "no next page")
//! ```
//!
//! Templates must treat the out-of-range `prev`/`next` values as sentinels.

/// Number of pages needed to show `total` items, `limit` per page.
///
/// A `limit` of zero yields zero pages; configuration never lets a zero
/// page size reach the renderers.
pub fn page_count(total: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// Navigation metadata for one page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub current: usize,
    pub prev: usize,
    pub next: usize,
    pub all: usize,
}

impl PageMeta {
    pub fn for_index(index: usize, all: usize) -> Self {
        Self {
            current: index + 1,
            prev: index,
            next: index + 2,
            all,
        }
    }

    /// 0-based index of this page.
    pub fn index(&self) -> usize {
        self.current - 1
    }

    /// Item offset of this page for the given page size.
    pub fn offset(&self, limit: usize) -> usize {
        limit * self.index()
    }
}

/// Metadata for every page of a listing of `total` items, in order.
pub fn pages(total: usize, limit: usize) -> impl Iterator<Item = PageMeta> {
    let all = page_count(total, limit);
    (0..all).map(move |i| PageMeta::for_index(i, all))
}

/// A contiguous run of page numbers around `current` for paginator widgets.
///
/// The run has `min(window, total_pages)` entries, stays inside
/// `1..=total_pages`, and is centred on `current` unless it hits an edge, in
/// which case it is shifted inwards. With an even window the extra slot goes
/// to the left of `current`. Non-positive `total_pages` or `window` give an
/// empty run.
pub fn page_window(current: i64, total_pages: i64, window: i64) -> Vec<i64> {
    if total_pages <= 0 || window <= 0 {
        return Vec::new();
    }
    let window = window.min(total_pages);

    let mut start = current.saturating_sub(window / 2);
    if start < 1 {
        start = 1;
    }
    let mut end = start.saturating_add(window - 1);
    if end > total_pages {
        end = total_pages;
        start = (end - window + 1).max(1);
    }

    (start..=end).collect()
}
