use serde::Serialize;

use super::params::{parse_int_prefix, QueryParams};

pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl Pagination {
    /// Clamps page and limit to at least 1 and derives the zero-based offset.
    pub fn new(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self { page, limit, offset: (page - 1).saturating_mul(limit) }
    }

    /// Apply an upper bound on the page size, when one is configured.
    pub fn capped(self, max_limit: Option<u64>) -> Self {
        match max_limit {
            Some(max) if self.limit > max => {
                tracing::debug!("limit {} exceeds max {}, capping", self.limit, max);
                Self::new(self.page, max)
            }
            _ => self,
        }
    }
}

/// Read `page` and `limit` from the query.
///
/// `page` defaults to 1 when missing or non-numeric. `limit` is only parsed
/// when the key is present; a missing or non-numeric limit uses
/// `default_limit`.
pub fn resolve_pagination(query: &QueryParams, default_limit: u64) -> Pagination {
    let page = query
        .first("page")
        .and_then(parse_int_prefix)
        .map(clamp_positive)
        .unwrap_or(1);

    let limit = if query.contains_key("limit") {
        query
            .first("limit")
            .and_then(parse_int_prefix)
            .map(clamp_positive)
            .unwrap_or(default_limit)
    } else {
        default_limit
    };

    Pagination::new(page, limit)
}

fn clamp_positive(n: i64) -> u64 {
    n.max(1) as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub items_per_page: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageInfo {
    pub fn offset(&self) -> u64 {
        Pagination::new(self.current_page, self.items_per_page).offset
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

pub fn format_page<T>(items: Vec<T>, total_count: u64, page: u64, limit: u64) -> PagedResult<T> {
    let total_pages = total_count.div_ceil(limit.max(1));
    PagedResult {
        items,
        pagination: PageInfo {
            total_items: total_count,
            total_pages,
            current_page: page,
            items_per_page: limit,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn empty_query_uses_defaults() {
        assert_eq!(
            resolve_pagination(&QueryParams::new(), 10),
            Pagination { page: 1, limit: 10, offset: 0 }
        );
    }

    #[test]
    fn page_and_limit_produce_offset() {
        assert_eq!(
            resolve_pagination(&query(&[("page", "3"), ("limit", "20")]), 10),
            Pagination { page: 3, limit: 20, offset: 40 }
        );
    }

    #[test]
    fn negative_and_zero_values_are_clamped() {
        assert_eq!(resolve_pagination(&query(&[("page", "-5")]), 10).page, 1);
        assert_eq!(resolve_pagination(&query(&[("page", "0")]), 10).page, 1);
        assert_eq!(resolve_pagination(&query(&[("limit", "0")]), 10).limit, 1);
        assert_eq!(resolve_pagination(&query(&[("limit", "-3")]), 10).limit, 1);
    }

    #[test]
    fn non_numeric_values_fall_back() {
        let p = resolve_pagination(&query(&[("page", "two"), ("limit", "lots")]), 25);
        assert_eq!(p, Pagination { page: 1, limit: 25, offset: 0 });

        let p = resolve_pagination(&query(&[("limit", "")]), 25);
        assert_eq!(p.limit, 25);
    }

    #[test]
    fn leading_digits_are_accepted() {
        let p = resolve_pagination(&query(&[("page", "2abc"), ("limit", "15.7")]), 10);
        assert_eq!(p, Pagination { page: 2, limit: 15, offset: 15 });
    }

    #[test]
    fn default_limit_is_clamped_too() {
        assert_eq!(resolve_pagination(&QueryParams::new(), 0).limit, 1);
    }

    #[test]
    fn capping_recomputes_offset() {
        let p = Pagination::new(3, 500).capped(Some(100));
        assert_eq!(p, Pagination { page: 3, limit: 100, offset: 200 });
        assert_eq!(Pagination::new(3, 50).capped(Some(100)).limit, 50);
        assert_eq!(Pagination::new(3, 500).capped(None).limit, 500);
    }

    #[test]
    fn formats_middle_page() {
        let items: Vec<u32> = (0..12).collect();
        let page = format_page(items, 42, 2, 10);
        assert_eq!(page.pagination.total_pages, 5);
        assert!(page.pagination.has_next_page);
        assert!(page.pagination.has_previous_page);
        assert_eq!(page.items.len(), 12);
    }

    #[test]
    fn formats_first_and_last_pages() {
        let first = format_page(Vec::<u32>::new(), 20, 1, 10).pagination;
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next_page);
        assert!(!first.has_previous_page);

        let last = format_page(Vec::<u32>::new(), 20, 2, 10).pagination;
        assert!(!last.has_next_page);

        let empty = format_page(Vec::<u32>::new(), 0, 1, 10).pagination;
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn serializes_camel_case_envelope() {
        let value = serde_json::to_value(format_page(vec!["a"], 1, 1, 10)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "items": ["a"],
                "pagination": {
                    "totalItems": 1,
                    "totalPages": 1,
                    "currentPage": 1,
                    "itemsPerPage": 10,
                    "hasNextPage": false,
                    "hasPreviousPage": false
                }
            })
        );
    }

    #[test]
    fn offset_round_trips_through_page_info() {
        for (page, limit) in [(1, 1), (1, 10), (4, 25), (17, 3), (100, 100)] {
            let p = Pagination::new(page, limit);
            let info = format_page(Vec::<u8>::new(), 1000, p.page, p.limit).pagination;
            assert_eq!(info.offset(), p.offset);
        }
    }
}
