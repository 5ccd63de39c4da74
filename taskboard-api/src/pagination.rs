/// Page-number pagination for list endpoints
///
/// List responses wrap their results in an envelope carrying the total row
/// count and links to the neighbouring pages:
///
/// ```json
/// {
///   "count": 23,
///   "next": "/api/v1/tasks/?page=3",
///   "previous": "/api/v1/tasks/?page=1",
///   "results": [...]
/// }
/// ```
///
/// Pages are 1-based. A page number that is not a positive integer, or that
/// lies past the last page, yields `404 {"detail": "Invalid page."}`. The
/// first page of an empty collection is valid and returns empty results.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Query parameters accepted by paginated endpoints
///
/// `page` is kept as a raw string so that non-numeric values map to the
/// invalid-page 404 rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Requested page number (1-based; default 1)
    pub page: Option<String>,
}

/// Paginated response envelope
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Total number of rows across all pages
    pub count: i64,

    /// URL of the next page, if any
    pub next: Option<String>,

    /// URL of the previous page, if any
    pub previous: Option<String>,

    /// Rows of the current page
    pub results: Vec<T>,
}

/// Resolved pagination window for one request
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    page: i64,
    page_size: i64,
}

fn invalid_page() -> ApiError {
    ApiError::NotFound("Invalid page.".to_string())
}

impl Pagination {
    /// Resolves the page number from the query string
    ///
    /// # Errors
    ///
    /// Returns the invalid-page 404 when `page` is present but not a
    /// positive integer.
    pub fn from_query(query: &PageQuery, page_size: i64) -> Result<Self, ApiError> {
        let page = match query.page.as_deref() {
            None => 1,
            Some(raw) => raw.parse::<i64>().map_err(|_| invalid_page())?,
        };

        if page < 1 {
            return Err(invalid_page());
        }

        Ok(Self { page, page_size })
    }

    /// Row limit for the underlying query
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Row offset for the underlying query
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// Wraps a page of results in the response envelope
    ///
    /// `path` is the request path used to construct the next/previous
    /// links; the previous link of page 2 is the bare path, matching the
    /// first page's canonical URL.
    ///
    /// # Errors
    ///
    /// Returns the invalid-page 404 when the requested page lies past the
    /// last page.
    pub fn build<T>(&self, path: &str, count: i64, results: Vec<T>) -> Result<Page<T>, ApiError> {
        let total_pages = if count == 0 {
            1
        } else {
            (count + self.page_size - 1) / self.page_size
        };

        if self.page > total_pages {
            return Err(invalid_page());
        }

        let next = if self.page < total_pages {
            Some(format!("{}?page={}", path, self.page + 1))
        } else {
            None
        };

        let previous = match self.page {
            1 => None,
            2 => Some(path.to_string()),
            p => Some(format!("{}?page={}", path, p - 1)),
        };

        Ok(Page {
            count,
            next,
            previous,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_default_page_is_first() {
        let p = Pagination::from_query(&query(None), 10).unwrap();
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_offset_scales_with_page() {
        let p = Pagination::from_query(&query(Some("3")), 10).unwrap();
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_non_numeric_page_is_invalid() {
        assert!(Pagination::from_query(&query(Some("abc")), 10).is_err());
        assert!(Pagination::from_query(&query(Some("0")), 10).is_err());
        assert!(Pagination::from_query(&query(Some("-1")), 10).is_err());
    }

    #[test]
    fn test_single_page_has_no_links() {
        let p = Pagination::from_query(&query(None), 10).unwrap();
        let page = p.build("/api/v1/tasks/", 3, vec![1, 2, 3]).unwrap();

        assert_eq!(page.count, 3);
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
        assert_eq!(page.results, vec![1, 2, 3]);
    }

    #[test]
    fn test_middle_page_links() {
        let p = Pagination::from_query(&query(Some("2")), 10).unwrap();
        let page = p.build("/api/v1/tasks/", 25, vec![0; 10]).unwrap();

        assert_eq!(page.next.as_deref(), Some("/api/v1/tasks/?page=3"));
        assert_eq!(page.previous.as_deref(), Some("/api/v1/tasks/"));
    }

    #[test]
    fn test_third_page_previous_keeps_page_param() {
        let p = Pagination::from_query(&query(Some("3")), 10).unwrap();
        let page = p.build("/api/v1/tasks/", 25, vec![0; 5]).unwrap();

        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("/api/v1/tasks/?page=2"));
    }

    #[test]
    fn test_page_past_the_end_is_invalid() {
        let p = Pagination::from_query(&query(Some("4")), 10).unwrap();
        assert!(p.build::<i32>("/api/v1/tasks/", 25, vec![]).is_err());
    }

    #[test]
    fn test_empty_first_page_is_valid() {
        let p = Pagination::from_query(&query(None), 10).unwrap();
        let page = p.build::<i32>("/api/v1/tasks/", 0, vec![]).unwrap();

        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
    }
}
