use crate::config::PaginationConfig;
use crate::errors::QueryError;
use crate::models::PageOption;

/// Page used when a request has none
pub const DEFAULT_PAGE: u64 = 1;
/// Page size used when a request has none
pub const DEFAULT_SIZE: u64 = 20;

/// A validated `(page, size)` pair and the arithmetic derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub page: u64,
    /// Records per page, always > 0
    pub size: u64,
}

impl PageWindow {
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPageRequest`] when `page` or `size` is 0.
    pub fn new(page: u64, size: u64) -> Result<Self, QueryError> {
        if page == 0 {
            return Err(QueryError::invalid_page("page must be at least 1"));
        }
        if size == 0 {
            return Err(QueryError::invalid_page("size must be greater than 0"));
        }
        Ok(Self { page, size })
    }

    /// Resolve a request against the configured defaults, clamping the size to `max_size`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PageWindow::new`].
    pub fn resolve(option: &PageOption, config: &PaginationConfig) -> Result<Self, QueryError> {
        let page = option.page.unwrap_or(config.default_page);
        let mut size = option.size.unwrap_or(config.default_size);
        if let Some(max_size) = config.max_size
            && size > max_size
        {
            tracing::debug!(requested = size, max_size, "Clamping page size");
            size = max_size;
        }
        Self::new(page, size)
    }

    /// Number of records before this page
    #[must_use]
    pub const fn skip(self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    #[must_use]
    pub const fn take(self) -> u64 {
        self.size
    }

    /// `ceil(total_count / size)`
    #[must_use]
    pub const fn total_pages(self, total_count: u64) -> u64 {
        total_count.div_ceil(self.size)
    }

    #[must_use]
    pub const fn has_prev(self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(self, total_pages: u64) -> bool {
        self.page < total_pages
    }
}
