//! Pagination for owner-scoped collections.

use serde::Serialize;

/// Page used when the client sends none
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the client sends none
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a client may request
pub const MAX_LIMIT: u32 = 100;

/// Error type for invalid pagination parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("Page must be at least 1")]
    PageOutOfRange,

    #[error("Limit must be between 1 and {max}")]
    LimitOutOfRange { max: u32 },
}

/// Validated 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Validates raw query parameters, filling in defaults for missing values
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, PageError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(PageError::PageOutOfRange);
        }
        if limit < 1 || limit > MAX_LIMIT {
            return Err(PageError::LimitOutOfRange { max: MAX_LIMIT });
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

/// One page of results plus totals over the whole (filtered) collection
#[derive(Debug, Clone, Serialize)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub total: i64,
    pub current_page: u32,
    pub total_pages: i64,
}

impl<R> Page<R> {
    pub fn new(items: Vec<R>, total: i64, request: PageRequest) -> Self {
        let limit = request.limit();
        Self {
            items,
            total,
            current_page: request.page(),
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = PageRequest::new(None, None).unwrap();
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 10);
        assert_eq!(request.offset(), 0);
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::new(Some(3), Some(25)).unwrap();
        assert_eq!(request.offset(), 50);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(PageRequest::new(Some(0), None), Err(PageError::PageOutOfRange));
        assert_eq!(
            PageRequest::new(None, Some(0)),
            Err(PageError::LimitOutOfRange { max: MAX_LIMIT })
        );
        assert!(PageRequest::new(None, Some(MAX_LIMIT + 1)).is_err());
        assert!(PageRequest::new(None, Some(MAX_LIMIT)).is_ok());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let request = PageRequest::new(Some(1), Some(10)).unwrap();
        assert_eq!(Page::<()>::new(vec![], 0, request).total_pages, 0);
        assert_eq!(Page::<()>::new(vec![], 10, request).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], 11, request).total_pages, 2);
    }
}
