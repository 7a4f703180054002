use serde::{Deserialize, Serialize};

/// Default page size when the client sends none.
pub const DEFAULT_LIMIT: i64 = 20;
/// Hard cap on page size; larger requests are clamped, not rejected.
pub const MAX_LIMIT: i64 = 50;

/// Pagination block returned alongside every paged listing.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn build(page: i64, limit: i64, total_count: i64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + limit - 1) / limit
        };
        Pagination {
            page,
            limit,
            total_count,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1 && total_pages > 0,
        }
    }
}

/// Clamp a requested limit into [1, MAX_LIMIT], defaulting when absent.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Page numbers start at 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_capped() {
        assert_eq!(clamp_limit(Some(500)), MAX_LIMIT);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
    }

    #[test]
    fn test_page_floor() {
        assert_eq!(clamp_page(Some(-3)), 1);
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some(7)), 7);
    }

    #[test]
    fn test_pagination_math() {
        let p = Pagination::build(2, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);

        let last = Pagination::build(3, 20, 45);
        assert!(!last.has_next_page);

        let empty = Pagination::build(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }
}
