use std::fmt;

use super::params::QueryParams;
use super::schema::EntitySchema;
use super::types::SortDirection;

pub const DEFAULT_SORT_COLUMN: &str = "createdAt";
pub const DEFAULT_SORT_DIRECTION: SortDirection = SortDirection::Desc;

/// Column to order by, optionally reached through a single-row association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPath {
    pub association: Option<String>,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: SortPath,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn column(column: impl Into<String>, direction: SortDirection) -> Self {
        Self { path: SortPath { association: None, column: column.into() }, direction }
    }

    pub fn nested(association: impl Into<String>, column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            path: SortPath { association: Some(association.into()), column: column.into() },
            direction,
        }
    }

    pub fn fallback() -> Self {
        Self::column(DEFAULT_SORT_COLUMN, DEFAULT_SORT_DIRECTION)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path.association {
            Some(association) => write!(f, "{}.{} {}", association, self.path.column, self.direction.to_sql()),
            None => write!(f, "{} {}", self.path.column, self.direction.to_sql()),
        }
    }
}

/// Resolve `sortBy` / `sortOrder` into a single validated sort key.
///
/// `aliases` maps friendly names (matched case-insensitively) to column paths
/// such as `category.name`. Columns in `excluded` are never sortable. Anything
/// that does not resolve to a real, allowed column falls back to
/// `createdAt DESC`; sorting never fails a request.
pub fn resolve_sort(
    query: &QueryParams,
    schema: &EntitySchema,
    excluded: &[&str],
    aliases: &[(&str, &str)],
) -> SortKey {
    let direction = query
        .first("sortOrder")
        .filter(|s| !s.is_empty())
        .and_then(SortDirection::parse)
        .unwrap_or(DEFAULT_SORT_DIRECTION);

    let requested = query
        .first("sortBy")
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SORT_COLUMN);

    let lowered = requested.to_lowercase();
    let requested = aliases
        .iter()
        .find(|(friendly, _)| friendly.to_lowercase() == lowered)
        .map(|(_, path)| *path)
        .unwrap_or(requested);

    let resolved = match requested.split_once('.') {
        Some((alias, rest)) => {
            let column = rest.split('.').next().unwrap_or(rest);
            resolve_nested(schema, alias, column, excluded, direction)
        }
        None => schema
            .find_column(requested)
            .filter(|c| !excluded.contains(&c.name.as_str()))
            .map(|c| SortKey::column(c.name.clone(), direction)),
    };

    resolved.unwrap_or_else(|| {
        tracing::debug!("sort '{}' not allowed on {}, using default order", requested, schema.name());
        SortKey::fallback()
    })
}

fn resolve_nested(
    schema: &EntitySchema,
    alias: &str,
    column: &str,
    excluded: &[&str],
    direction: SortDirection,
) -> Option<SortKey> {
    let association = schema
        .find_association(alias)
        .filter(|a| a.kind.is_single_row())?;
    let column = association
        .target
        .find_column(column)
        .filter(|c| !excluded.contains(&c.name.as_str()))?;
    Some(SortKey::nested(association.alias.clone(), column.name.clone(), direction))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::query::schema::ColumnType;

    fn product_schema() -> EntitySchema {
        let category = Arc::new(
            EntitySchema::new("ProductCategory", "product_categories")
                .column("id", ColumnType::Uuid)
                .column("name", ColumnType::Text)
                .column("secretCode", ColumnType::Text)
                .timestamps(),
        );
        let review = Arc::new(
            EntitySchema::new("Review", "reviews")
                .column("id", ColumnType::Uuid)
                .column("rating", ColumnType::Integer),
        );
        EntitySchema::new("Product", "products")
            .column("id", ColumnType::Uuid)
            .column("name", ColumnType::Text)
            .column("price", ColumnType::Decimal)
            .column("imageUrl", ColumnType::Text)
            .timestamps()
            .belongs_to("category", "categoryId", category)
            .has_many("reviews", "productId", review)
    }

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    const EXCLUDED: &[&str] = &["imageUrl", "secretCode"];
    const ALIASES: &[(&str, &str)] = &[("categoryName", "category.name")];

    #[test]
    fn defaults_to_created_at_desc() {
        let key = resolve_sort(&QueryParams::new(), &product_schema(), EXCLUDED, ALIASES);
        assert_eq!(key, SortKey::column("createdAt", SortDirection::Desc));
    }

    #[test]
    fn normalizes_column_casing() {
        let schema = product_schema();
        for raw in ["price", "PRICE", "pRiCe"] {
            let key = resolve_sort(&query(&[("sortBy", raw), ("sortOrder", "asc")]), &schema, EXCLUDED, ALIASES);
            assert_eq!(key, SortKey::column("price", SortDirection::Asc));
        }
    }

    #[test]
    fn invalid_order_falls_back_to_desc() {
        let schema = product_schema();
        for order in ["", "sideways", "ascending", "1"] {
            let key = resolve_sort(&query(&[("sortBy", "name"), ("sortOrder", order)]), &schema, EXCLUDED, ALIASES);
            assert_eq!(key.direction, SortDirection::Desc, "order {:?}", order);
            assert_eq!(key.path.column, "name");
        }
    }

    #[test]
    fn unknown_or_excluded_columns_use_default() {
        let schema = product_schema();
        for raw in ["nope", "imageUrl", "IMAGEURL", "price; DROP TABLE products"] {
            let key = resolve_sort(&query(&[("sortBy", raw)]), &schema, EXCLUDED, ALIASES);
            assert_eq!(key, SortKey::fallback(), "sortBy {:?}", raw);
        }
    }

    #[test]
    fn fallback_ignores_requested_direction() {
        let key = resolve_sort(
            &query(&[("sortBy", "bogus"), ("sortOrder", "asc")]),
            &product_schema(),
            EXCLUDED,
            ALIASES,
        );
        assert_eq!(key.to_string(), "createdAt DESC");
    }

    #[test]
    fn alias_map_rewrites_to_association_path() {
        let key = resolve_sort(
            &query(&[("sortBy", "CATEGORYNAME"), ("sortOrder", "ASC")]),
            &product_schema(),
            EXCLUDED,
            ALIASES,
        );
        assert_eq!(key, SortKey::nested("category", "name", SortDirection::Asc));
    }

    #[test]
    fn dotted_path_matches_alias_and_column_case_insensitively() {
        let key = resolve_sort(&query(&[("sortBy", "Category.NAME")]), &product_schema(), EXCLUDED, ALIASES);
        assert_eq!(key, SortKey::nested("category", "name", SortDirection::Desc));
    }

    #[test]
    fn dotted_path_rejections_use_default() {
        let schema = product_schema();
        for raw in ["brand.name", "reviews.rating", "category.nope", "category.secretCode", "category.", ".name"] {
            let key = resolve_sort(&query(&[("sortBy", raw), ("sortOrder", "asc")]), &schema, EXCLUDED, ALIASES);
            assert_eq!(key, SortKey::fallback(), "sortBy {:?}", raw);
        }
    }

    #[test]
    fn multi_valued_parameters_use_first_value() {
        let params = QueryParams::parse("sortBy=name&sortBy=price&sortOrder=asc&sortOrder=desc");
        let key = resolve_sort(&params, &product_schema(), EXCLUDED, ALIASES);
        assert_eq!(key, SortKey::column("name", SortDirection::Asc));
    }

    #[test]
    fn empty_sort_by_uses_default_column_with_requested_direction() {
        let key = resolve_sort(&query(&[("sortBy", ""), ("sortOrder", "asc")]), &product_schema(), EXCLUDED, ALIASES);
        assert_eq!(key, SortKey::column("createdAt", SortDirection::Asc));
    }
}
