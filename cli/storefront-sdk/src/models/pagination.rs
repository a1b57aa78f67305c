//! Page arithmetic shared by every listing.
//!
//! All functions here are pure. Page numbers are 1-based.

use std::num::NonZeroU32;

use storefront_catalog::types::{Product, ResultPage};

/// Number of page buttons shown at once.
pub const DEFAULT_WINDOW_SIZE: NonZeroU32 = NonZeroU32::new(5).unwrap();

/// Number of pages needed to show `total` items, `ceil(total / page_size)`.
///
/// Saturates at [u32::MAX].
pub fn total_pages(total: u64, page_size: NonZeroU32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size.get()));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Index of the first item of `page`.
pub fn page_offset(page: NonZeroU32, page_size: NonZeroU32) -> u64 {
    u64::from(page.get() - 1) * u64::from(page_size.get())
}

/// The page numbers to show as navigation buttons.
///
/// Shows every page if there are at most `window_size` of them. Otherwise the
/// window follows `current_page`, but is pinned to the first or last pages
/// when `current_page` is close to either end. An empty catalog yields an
/// empty window.
pub fn compute_page_window(
    total: u64,
    page_size: NonZeroU32,
    current_page: NonZeroU32,
    window_size: NonZeroU32,
) -> Vec<u32> {
    let total_pages = total_pages(total, page_size);
    let window = window_size.get();
    if total_pages <= window {
        return (1..=total_pages).collect();
    }

    let half = window / 2;
    let current = current_page.get();
    let first = if current <= half + 1 {
        1
    } else if current >= total_pages - half {
        total_pages - window + 1
    } else {
        current - half
    };

    (first..first + window).collect()
}

/// Cut page `page` out of a complete, unpaginated result set.
///
/// Returns at most `page_size` items starting at [page_offset]; pages past
/// the end are empty.
pub fn slice_page<T>(all: Vec<T>, page: NonZeroU32, page_size: NonZeroU32) -> Vec<T> {
    let offset = usize::try_from(page_offset(page, page_size)).unwrap_or(usize::MAX);
    all.into_iter()
        .skip(offset)
        .take(page_size.get() as usize)
        .collect()
}

/// Re-paginate a complete result set into the same shape a server paginated
/// listing has.
///
/// The reported total is the size of the complete set, not of the slice.
pub fn paginate_locally(
    all: Vec<Product>,
    page: NonZeroU32,
    page_size: NonZeroU32,
) -> ResultPage {
    let total = all.len() as u64;
    ResultPage::new(slice_page(all, page, page_size), total, page_size)
}

/// Everything a view needs to render pagination controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub current_page: NonZeroU32,
    pub total_pages: u32,
    pub window: Vec<u32>,
    pub has_previous: bool,
    pub has_next: bool,
    /// False while a fetch is pending.
    pub enabled: bool,
}

impl PageControls {
    pub fn new(total: u64, page_size: NonZeroU32, current_page: NonZeroU32, loading: bool) -> Self {
        let total_pages = total_pages(total, page_size);
        Self {
            current_page,
            total_pages,
            window: compute_page_window(total, page_size, current_page, DEFAULT_WINDOW_SIZE),
            has_previous: current_page.get() > 1,
            has_next: current_page.get() < total_pages,
            enabled: !loading,
        }
    }

    /// A single page doesn't need navigation.
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }
}
