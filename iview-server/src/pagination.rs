//! Pagination for list endpoints (50 rows/page)

use serde::{Deserialize, Serialize};

/// Page size for all list endpoints
pub const PAGE_SIZE: i64 = 50;

/// `?page=` query parameter
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1 }
    }
}

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET
    #[serde(skip)]
    pub offset: i64,
}

/// Calculate pagination, clamping `requested_page` into `[1, total_pages]`
///
/// # Examples
/// ```
/// use iview_server::pagination::calculate_pagination;
///
/// // 120 results = 3 pages (50 + 50 + 20)
/// let p = calculate_pagination(120, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 50);
///
/// // Out-of-bounds page gets clamped
/// let p = calculate_pagination(120, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 100);
/// ```
pub fn calculate_pagination(total: i64, requested_page: i64) -> Pagination {
    let total_pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        page_size: PAGE_SIZE,
        total,
        total_pages,
        offset,
    }
}

/// A page of items plus its metadata
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_first_page() {
        let p = calculate_pagination(75, 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_out_of_bounds_low() {
        let p = calculate_pagination(75, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 3);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_exact_boundary() {
        let p = calculate_pagination(100, 2);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 50);
    }

    #[test]
    fn test_page_serializes_flat() {
        let page = Page {
            items: vec![1, 2],
            pagination: calculate_pagination(2, 1),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["page_size"], 50);
        assert!(json.get("offset").is_none());
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }
}
