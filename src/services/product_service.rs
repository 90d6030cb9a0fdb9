use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::database::models::ProductListItem;
use crate::database::repository::{ProductQuery, ProductStore};
use crate::database::schemas::schemas;
use crate::error::ApiError;
use crate::query::pagination::DEFAULT_LIMIT;
use crate::query::{
    format_page, resolve_filters, resolve_pagination, resolve_sort, FilterConfig, FilterOp, FilterRule, PagedResult,
    QueryParams,
};

/// Friendly sort names accepted by the listing.
pub const SORT_ALIASES: &[(&str, &str)] = &[("categoryName", "category.name")];

/// Columns that exist but may not be sorted on.
pub const EXCLUDED_SORT_COLUMNS: &[&str] = &["imageUrl"];

static PRODUCT_FILTERS: Lazy<FilterConfig> = Lazy::new(|| {
    FilterConfig::new()
        .rule("search", FilterRule::any_of(["name", "sku", "category.name"], FilterOp::ILike))
        .rule("categoryId", FilterRule::eq())
        .rule("minPrice", FilterRule::new(FilterOp::Gte).field("price").number())
        .rule("maxPrice", FilterRule::new(FilterOp::Lte).field("price").number())
        .rule("isActive", FilterRule::eq().boolean())
});

pub struct ProductService {
    products: Arc<dyn ProductStore>,
    max_limit: Option<u64>,
    debug_logging: bool,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>, max_limit: Option<u64>) -> Self {
        Self { products, max_limit, debug_logging: false }
    }

    /// Log the resolved filter tree for every listing.
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Translate the query string, then fetch one page of products.
    pub fn translate(&self, query: &QueryParams) -> ProductQuery {
        let sort = resolve_sort(query, &schemas().products, EXCLUDED_SORT_COLUMNS, SORT_ALIASES);
        let filter = resolve_filters(query, &PRODUCT_FILTERS);
        let pagination = resolve_pagination(query, DEFAULT_LIMIT).capped(self.max_limit);
        ProductQuery { filter, sort, pagination }
    }

    pub async fn list(&self, query: &QueryParams) -> Result<PagedResult<ProductListItem>, ApiError> {
        let resolved = self.translate(query);
        tracing::debug!(
            sort = %resolved.sort,
            page = resolved.pagination.page,
            limit = resolved.pagination.limit,
            "listing products"
        );
        if let Some(filter) = self.filter_trace(&resolved) {
            tracing::debug!(%filter, "resolved product filter");
        }

        let (items, total) = self.products.find_and_count(&resolved).await?;
        Ok(format_page(items, total, resolved.pagination.page, resolved.pagination.limit))
    }

    fn filter_trace(&self, resolved: &ProductQuery) -> Option<serde_json::Value> {
        self.debug_logging.then(|| resolved.filter.to_json())
    }
}
