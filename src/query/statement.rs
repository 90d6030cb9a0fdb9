use super::error::QueryError;
use super::filter::FilterSpec;
use super::pagination::Pagination;
use super::schema::{Association, AssociationKind, Column, ColumnType, EntitySchema};
use super::sort::SortKey;
use super::types::{FieldRef, FilterOp, FilterValue, SqlParam, SqlResult};

/// Renders translator output into parameterised PostgreSQL.
///
/// Single-row associations are LEFT JOINed under their alias, either
/// explicitly via [`Statement::include`] or implicitly when a filter or sort
/// key references them. Soft-deleted rows are excluded from the root table and
/// from every join.
pub struct Statement<'a> {
    schema: &'a EntitySchema,
    select: Vec<(FieldRef, Option<String>)>,
    includes: Vec<&'a Association>,
    filter: FilterSpec,
    order: Vec<SortKey>,
    pagination: Option<Pagination>,
}

impl<'a> Statement<'a> {
    pub fn new(schema: &'a EntitySchema) -> Result<Self, QueryError> {
        validate_identifier(schema.table())?;
        Ok(Self {
            schema,
            select: vec![],
            includes: vec![],
            filter: FilterSpec::default(),
            order: vec![],
            pagination: None,
        })
    }

    pub fn select(&mut self, field: &str) -> Result<&mut Self, QueryError> {
        let field = FieldRef::parse(field);
        self.track(&field)?;
        self.select.push((field, None));
        Ok(self)
    }

    pub fn select_as(&mut self, field: &str, alias: &str) -> Result<&mut Self, QueryError> {
        validate_identifier(alias)?;
        let field = FieldRef::parse(field);
        self.track(&field)?;
        self.select.push((field, Some(alias.to_string())));
        Ok(self)
    }

    pub fn include(&mut self, alias: &str) -> Result<&mut Self, QueryError> {
        let schema = self.schema;
        let association = schema.find_association(alias).ok_or_else(|| QueryError::UnknownAssociation {
            entity: schema.name().to_string(),
            alias: alias.to_string(),
        })?;
        self.join(association)?;
        Ok(self)
    }

    pub fn filter(&mut self, spec: FilterSpec) -> Result<&mut Self, QueryError> {
        for field in spec.field_refs() {
            self.track(field)?;
        }
        self.filter = spec;
        Ok(self)
    }

    pub fn order(&mut self, key: SortKey) -> Result<&mut Self, QueryError> {
        let field = FieldRef { association: key.path.association.clone(), column: key.path.column.clone() };
        self.track(&field)?;
        self.order.push(key);
        Ok(self)
    }

    pub fn paginate(&mut self, pagination: Pagination) -> &mut Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, QueryError> {
        let mut params = Params::default();
        let select_clause = self.build_select_clause()?;
        let from_clause = self.build_from_clause()?;
        let where_clause = self.build_where_clause(&mut params)?;
        let order_clause = self.build_order_clause()?;
        let limit_clause = match self.pagination {
            Some(p) => format!(
                "LIMIT {} OFFSET {}",
                params.push(SqlParam::Int(to_i64(p.limit))),
                params.push(SqlParam::Int(to_i64(p.offset)))
            ),
            None => String::new(),
        };

        let query = [
            format!("SELECT {}", select_clause),
            from_clause,
            where_clause.map(|w| format!("WHERE {}", w)).unwrap_or_default(),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: params.values })
    }

    /// Counts every row matching the filter, ignoring order and pagination.
    pub fn to_count_sql(&self) -> Result<SqlResult, QueryError> {
        let mut params = Params::default();
        let from_clause = self.build_from_clause()?;
        let query = match self.build_where_clause(&mut params)? {
            Some(w) => format!("SELECT COUNT(*) AS count {} WHERE {}", from_clause, w),
            None => format!("SELECT COUNT(*) AS count {}", from_clause),
        };
        Ok(SqlResult { query, params: params.values })
    }

    /// Resolve a field, joining its association when needed.
    fn track(&mut self, field: &FieldRef) -> Result<(), QueryError> {
        let (association, _) = lookup(self.schema, field)?;
        if let Some(association) = association {
            self.join(association)?;
        }
        Ok(())
    }

    fn join(&mut self, association: &'a Association) -> Result<(), QueryError> {
        if !association.kind.is_single_row() {
            return Err(QueryError::NotSingleRow(association.alias.clone()));
        }
        validate_identifier(&association.alias)?;
        validate_identifier(association.target.table())?;
        if !self.includes.iter().any(|a| a.alias == association.alias) {
            self.includes.push(association);
        }
        Ok(())
    }

    fn qualified(&self, field: &FieldRef) -> Result<(String, &'a Column), QueryError> {
        let (association, column) = lookup(self.schema, field)?;
        let qualifier = association.map(|a| a.alias.as_str()).unwrap_or(self.schema.table());
        Ok((format!("{}.{}", quote(qualifier), quote(&column.db_name)), column))
    }

    fn build_select_clause(&self) -> Result<String, QueryError> {
        if self.select.is_empty() {
            return Ok(format!("{}.*", quote(self.schema.table())));
        }
        let mut parts = Vec::with_capacity(self.select.len());
        for (field, alias) in &self.select {
            let (column, _) = self.qualified(field)?;
            parts.push(match alias {
                Some(alias) => format!("{} AS {}", column, quote(alias)),
                None => column,
            });
        }
        Ok(parts.join(", "))
    }

    fn build_from_clause(&self) -> Result<String, QueryError> {
        let root = self.schema.table();
        let mut sql = format!("FROM {}", quote(root));
        for association in &self.includes {
            let target = &association.target;
            let alias = quote(&association.alias);
            let on = match association.kind {
                AssociationKind::BelongsTo => {
                    let fk = column_of(self.schema, &association.foreign_key)?;
                    let pk = column_of(target, target.primary_key())?;
                    format!("{}.{} = {}.{}", alias, quote(&pk.db_name), quote(root), quote(&fk.db_name))
                }
                _ => {
                    let fk = column_of(target, &association.foreign_key)?;
                    let pk = column_of(self.schema, self.schema.primary_key())?;
                    format!("{}.{} = {}.{}", alias, quote(&fk.db_name), quote(root), quote(&pk.db_name))
                }
            };
            let live = target
                .soft_delete_column()
                .map(|c| format!(" AND {}.{} IS NULL", alias, quote(&c.db_name)))
                .unwrap_or_default();
            sql.push_str(&format!(" LEFT JOIN {} AS {} ON {}{}", quote(target.table()), alias, on, live));
        }
        Ok(sql)
    }

    fn build_where_clause(&self, params: &mut Params) -> Result<Option<String>, QueryError> {
        let mut conditions = vec![];
        if let Some(deleted) = self.schema.soft_delete_column() {
            conditions.push(format!("{}.{} IS NULL", quote(self.schema.table()), quote(&deleted.db_name)));
        }
        for (field, ops) in &self.filter.fields {
            for (op, value) in ops {
                conditions.push(self.build_condition(field, *op, value, params)?);
            }
        }
        if !self.filter.any_of.is_empty() {
            let mut group = Vec::with_capacity(self.filter.any_of.len());
            for predicate in &self.filter.any_of {
                group.push(self.build_condition(&predicate.field, predicate.op, &predicate.value, params)?);
            }
            conditions.push(format!("({})", group.join(" OR ")));
        }
        Ok(if conditions.is_empty() { None } else { Some(conditions.join(" AND ")) })
    }

    fn build_condition(
        &self,
        field: &FieldRef,
        op: FilterOp,
        value: &FilterValue,
        params: &mut Params,
    ) -> Result<String, QueryError> {
        let (column_sql, column) = self.qualified(field)?;
        let (lhs, param, cast) = operands(column_sql, column, op, value);
        Ok(format!("{} {} {}{}", lhs, op.to_sql(), params.push(param), cast))
    }

    fn build_order_clause(&self) -> Result<String, QueryError> {
        if self.order.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let field = FieldRef { association: key.path.association.clone(), column: key.path.column.clone() };
            let (column, _) = self.qualified(&field)?;
            parts.push(format!("{} {}", column, key.direction.to_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

/// Pick the left-hand expression, bind value and placeholder cast for a
/// comparison so both sides have compatible PostgreSQL types.
fn operands(column_sql: String, column: &Column, op: FilterOp, value: &FilterValue) -> (String, SqlParam, &'static str) {
    if op.is_like() {
        let lhs = if column.column_type == ColumnType::Text { column_sql } else { format!("{}::text", column_sql) };
        return (lhs, SqlParam::Text(value.to_string()), "");
    }
    match (column.column_type, value) {
        (ColumnType::Text, v) => (column_sql, SqlParam::Text(v.to_string()), ""),
        (ColumnType::Timestamp, FilterValue::Text(s)) => (column_sql, SqlParam::Text(s.clone()), "::timestamptz"),
        (ColumnType::Integer | ColumnType::Decimal, FilterValue::Number(n)) => (column_sql, SqlParam::Float(*n), ""),
        (ColumnType::Boolean, FilterValue::Bool(b)) => (column_sql, SqlParam::Bool(*b), ""),
        (_, v) => (format!("{}::text", column_sql), SqlParam::Text(v.to_string()), ""),
    }
}

fn lookup<'s>(schema: &'s EntitySchema, field: &FieldRef) -> Result<(Option<&'s Association>, &'s Column), QueryError> {
    match &field.association {
        Some(alias) => {
            let association = schema.find_association(alias).ok_or_else(|| QueryError::UnknownAssociation {
                entity: schema.name().to_string(),
                alias: alias.clone(),
            })?;
            let column = column_of(&association.target, &field.column)?;
            Ok((Some(association), column))
        }
        None => Ok((None, column_of(schema, &field.column)?)),
    }
}

fn column_of<'s>(schema: &'s EntitySchema, name: &str) -> Result<&'s Column, QueryError> {
    let column = schema.find_column(name).ok_or_else(|| QueryError::UnknownColumn {
        entity: schema.name().to_string(),
        column: name.to_string(),
    })?;
    validate_identifier(&column.db_name)?;
    Ok(column)
}

#[derive(Default)]
struct Params {
    values: Vec<SqlParam>,
}

impl Params {
    fn push(&mut self, value: SqlParam) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn validate_identifier(name: &str) -> Result<(), QueryError> {
    let mut chars = name.chars();
    let valid_start = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::query::filter::{resolve_filters, FilterConfig, FilterRule};
    use crate::query::params::QueryParams;
    use crate::query::types::SortDirection;

    fn product_schema() -> EntitySchema {
        let category = Arc::new(
            EntitySchema::new("ProductCategory", "product_categories")
                .column("id", ColumnType::Uuid)
                .column("name", ColumnType::Text)
                .timestamps(),
        );
        let tag = Arc::new(EntitySchema::new("Tag", "tags").column("id", ColumnType::Uuid));
        EntitySchema::new("Product", "products")
            .column("id", ColumnType::Uuid)
            .column("categoryId", ColumnType::Uuid)
            .column("name", ColumnType::Text)
            .column("price", ColumnType::Decimal)
            .column("sku", ColumnType::Text)
            .column("isActive", ColumnType::Boolean)
            .timestamps()
            .belongs_to("category", "categoryId", category)
            .has_many("tags", "productId", tag)
    }

    fn catalog_filters() -> FilterConfig {
        FilterConfig::new()
            .rule("search", FilterRule::any_of(["name", "sku", "category.name"], FilterOp::ILike))
            .rule("categoryId", FilterRule::eq())
            .rule("minPrice", FilterRule::new(FilterOp::Gte).field("price").number())
            .rule("isActive", FilterRule::eq().boolean())
    }

    #[test]
    fn plain_select_excludes_soft_deleted_rows() {
        let schema = product_schema();
        let sql = Statement::new(&schema).unwrap().to_sql().unwrap();
        assert_eq!(sql.query, r#"SELECT "products".* FROM "products" WHERE "products"."deleted_at" IS NULL"#);
        assert!(sql.params.is_empty());
    }

    #[test]
    fn renders_full_listing_query() {
        let schema = product_schema();
        let query: QueryParams = [("search", "tv"), ("minPrice", "10")].into_iter().collect();
        let spec = resolve_filters(&query, &catalog_filters());

        let mut statement = Statement::new(&schema).unwrap();
        statement
            .select("id").unwrap()
            .select("name").unwrap()
            .select_as("category.name", "category_name").unwrap()
            .filter(spec).unwrap()
            .order(SortKey::nested("category", "name", SortDirection::Asc)).unwrap()
            .paginate(Pagination::new(2, 10));
        let sql = statement.to_sql().unwrap();

        assert_eq!(
            sql.query,
            concat!(
                r#"SELECT "products"."id", "products"."name", "category"."name" AS "category_name" "#,
                r#"FROM "products" LEFT JOIN "product_categories" AS "category" ON "category"."id" = "products"."category_id" AND "category"."deleted_at" IS NULL "#,
                r#"WHERE "products"."deleted_at" IS NULL AND "products"."price" >= $1 "#,
                r#"AND ("products"."name" ILIKE $2 OR "products"."sku" ILIKE $3 OR "category"."name" ILIKE $4) "#,
                r#"ORDER BY "category"."name" ASC LIMIT $5 OFFSET $6"#
            )
        );
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Float(10.0),
                SqlParam::Text("%tv%".into()),
                SqlParam::Text("%tv%".into()),
                SqlParam::Text("%tv%".into()),
                SqlParam::Int(10),
                SqlParam::Int(10),
            ]
        );
    }

    #[test]
    fn count_query_shares_filter_but_not_pagination() {
        let schema = product_schema();
        let query: QueryParams = [("isActive", "true")].into_iter().collect();
        let mut statement = Statement::new(&schema).unwrap();
        statement
            .filter(resolve_filters(&query, &catalog_filters())).unwrap()
            .order(SortKey::fallback()).unwrap()
            .paginate(Pagination::new(1, 10));
        let sql = statement.to_count_sql().unwrap();
        assert_eq!(
            sql.query,
            r#"SELECT COUNT(*) AS count FROM "products" WHERE "products"."deleted_at" IS NULL AND "products"."is_active" = $1"#
        );
        assert_eq!(sql.params, vec![SqlParam::Bool(true)]);
    }

    #[test]
    fn uuid_equality_compares_as_text() {
        let schema = product_schema();
        let query: QueryParams = [("categoryId", "not-a-uuid")].into_iter().collect();
        let mut statement = Statement::new(&schema).unwrap();
        statement.filter(resolve_filters(&query, &catalog_filters())).unwrap();
        let sql = statement.to_count_sql().unwrap();
        assert!(sql.query.ends_with(r#""products"."category_id"::text = $1"#), "{}", sql.query);
    }

    #[test]
    fn sorting_through_association_adds_join() {
        let schema = product_schema();
        let mut statement = Statement::new(&schema).unwrap();
        statement.order(SortKey::nested("category", "name", SortDirection::Desc)).unwrap();
        let sql = statement.to_sql().unwrap();
        assert!(sql.query.contains(r#"LEFT JOIN "product_categories" AS "category""#));
        assert!(sql.query.ends_with(r#"ORDER BY "category"."name" DESC"#));
    }

    #[test]
    fn misdeclared_fields_are_errors() {
        let schema = product_schema();
        let mut statement = Statement::new(&schema).unwrap();
        assert!(matches!(statement.select("nope"), Err(QueryError::UnknownColumn { .. })));
        assert!(matches!(statement.include("brand"), Err(QueryError::UnknownAssociation { .. })));
        assert!(matches!(statement.include("tags"), Err(QueryError::NotSingleRow(_))));
        assert!(matches!(statement.select_as("name", "bad alias"), Err(QueryError::InvalidIdentifier(_))));
    }

    #[test]
    fn include_is_idempotent() {
        let schema = product_schema();
        let mut statement = Statement::new(&schema).unwrap();
        statement.include("category").unwrap().include("CATEGORY").unwrap();
        let sql = statement.to_sql().unwrap();
        assert_eq!(sql.query.matches("LEFT JOIN").count(), 1);
    }
}
