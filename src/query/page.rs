//! Page arithmetic for filtered result lists.

use std::ops::Range;

/// Position of one page within a filtered result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page actually served after clamping.
    pub page: usize,
    /// `ceil(total / page_size)`; 0 for an empty list.
    pub total_pages: usize,
    /// Slice bounds, always within `0..=total`.
    pub range: Range<usize>,
}

/// Computes the window for `requested` (1-based) over `total` items.
///
/// A request past the last page clamps to the last page. An empty list
/// yields page 1 with an empty range. A `page_size` of 0 is treated as 1.
#[must_use]
pub fn page_window(total: usize, requested: usize, page_size: usize) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size);

    if total_pages == 0 {
        return PageWindow {
            page: 1,
            total_pages: 0,
            range: 0..0,
        };
    }

    let page = requested.clamp(1, total_pages);
    let start = ((page - 1) * page_size).min(total);
    let end = start.saturating_add(page_size).min(total);

    PageWindow {
        page,
        total_pages,
        range: start..end,
    }
}
