//! Page-number pagination for list endpoints
//!
//! Lists are answered as `{count, next, previous, page_count, results}`
//! where `next` and `previous` are page numbers.

use serde::{Deserialize, Serialize};

use crate::core::config::ApiConfig;
use crate::core::error::{Error, Result};

/// Query parameters accepted by every list endpoint
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationQueryParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Items per page
    pub page_size: Option<u64>,
}

/// Statistics about a paginated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationStats {
    /// The total number of items
    pub count: u64,
    /// The previous page number, if any
    pub previous: Option<u64>,
    /// The next page number, if any
    pub next: Option<u64>,
    /// The total number of pages, at least 1
    pub page_count: u64,
}

/// One page of a list response
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Navigation fields
    #[serde(flatten)]
    pub stats: PaginationStats,
    /// Items of the requested page
    pub results: Vec<T>,
}

impl PaginationQueryParams {
    /// Check the requested page and page size against the API limits
    pub fn validate(&self, config: &ApiConfig) -> Result<(u64, u64)> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(Error::invalid_input("invalid page 0, pages start at 1"));
        }

        let page_size = self.page_size.unwrap_or(config.default_page_size);
        if page_size == 0 || page_size > config.max_page_size {
            return Err(Error::invalid_input(format!(
                "invalid page_size {}, expected a value between 1 and {}",
                page_size, config.max_page_size
            )));
        }

        Ok((page, page_size))
    }

    /// Cut the requested page out of `items`
    ///
    /// Asking for a page past the last one is answered like a missing
    /// object. The first page always exists, even for an empty list.
    pub fn paginate<T>(&self, items: Vec<T>, config: &ApiConfig) -> Result<Page<T>> {
        let (page, page_size) = self.validate(config)?;
        let count = items.len() as u64;
        let page_count = count.div_ceil(page_size).max(1);
        if page > page_count {
            return Err(Error::not_found("Invalid page."));
        }

        let offset = ((page - 1) * page_size) as usize;
        let results: Vec<T> = items
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Ok(Page {
            stats: PaginationStats {
                count,
                previous: (page > 1).then(|| page - 1),
                next: (page < page_count).then(|| page + 1),
                page_count,
            },
            results,
        })
    }
}
