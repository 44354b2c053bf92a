use serde::{Deserialize, Serialize};

/// Page number used when the requested one is below 1.
pub const DEFAULT_PAGE_NUMBER: u32 = 1;

/// Page size used when the requested one is below 1.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound applied to every requested page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A normalized page request (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    /// Creates a page request, normalizing out-of-range values.
    ///
    /// A number or size of 0 falls back to the defaults (1, 10); sizes above
    /// [`MAX_PAGE_SIZE`] are capped.
    pub fn new(number: u32, size: u32) -> Self {
        let number = if number < 1 {
            DEFAULT_PAGE_NUMBER
        } else {
            number
        };
        let size = match size {
            0 => DEFAULT_PAGE_SIZE,
            s => s.min(MAX_PAGE_SIZE),
        };
        Self { number, size }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of items to skip before this page starts.
    pub fn offset(&self) -> usize {
        (self.number as usize - 1) * self.size as usize
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE)
    }
}

/// One page of query results.
///
/// `total_count` is computed from the same predicate as `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: Page) -> Self {
        Self {
            items,
            total_count,
            page_number: page.number(),
            page_size: page.size(),
        }
    }

    /// An empty page for the given request.
    pub fn empty(page: Page) -> Self {
        Self::new(Vec::new(), 0, page)
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size as u64)
    }

    pub fn has_next_page(&self) -> bool {
        (self.page_number as u64) < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_number > 1
    }

    /// Transforms the items while keeping the paging metadata.
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}
