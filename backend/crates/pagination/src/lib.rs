//! Page-number pagination primitives shared by listing endpoints.
//!
//! A [`PageRequest`] carries a validated 1-based page number and page size.
//! A [`Page`] wraps the items of one page together with the totals clients
//! need to render pagination controls:
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::new(2, 10).expect("valid page request");
//! assert_eq!(request.offset(), 10);
//!
//! let page = Page::new(vec!["a", "b"], 12, request);
//! assert_eq!(page.total_pages(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Page size applied when a caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validation failures raised when building a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Page numbers start at one.
    #[error("page must be at least 1")]
    ZeroPage,
    /// The page size must be within `1..=MAX_PAGE_SIZE`.
    #[error("limit must be between 1 and {max}", max = MAX_PAGE_SIZE)]
    LimitOutOfRange,
}

/// Validated 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a page request, rejecting a zero page or an out-of-range limit.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when either value is out of range.
    pub const fn new(page: u32, limit: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(PageRequestError::LimitOutOfRange);
        }
        Ok(Self { page, limit })
    }

    /// Build a page request from optional query parameters, applying
    /// defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when a supplied value is out of range.
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Result<Self, PageRequestError> {
        Self::new(page.unwrap_or(1), limit.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// Current 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items skipped before this page starts.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the totals of the whole result set.
///
/// Serialises as `{ items, totalRecords, currentPage, totalPages }`; adapters
/// may rename `items` by flattening the page into their own envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    total_records: u64,
    current_page: u32,
    total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from its items and the total record count.
    #[must_use]
    pub fn new(items: Vec<T>, total_records: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_records,
            current_page: request.page(),
            total_pages: total_records.div_ceil(u64::from(request.limit())),
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Total number of records across all pages.
    #[must_use]
    pub const fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Current 1-based page number.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Number of pages needed to show every record.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Transform the items while keeping the totals.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_records: self.total_records,
            current_page: self.current_page,
            total_pages: self.total_pages,
        }
    }

    /// Consume the page, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
