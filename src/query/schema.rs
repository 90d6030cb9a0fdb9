use std::collections::HashMap;
use std::sync::Arc;

/// Storage type of a column, used to pick casts when rendering comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
}

#[derive(Debug, Clone)]
pub struct Column {
    /// API-facing name, e.g. `createdAt`.
    pub name: String,
    /// Database column, e.g. `created_at`.
    pub db_name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
}

impl AssociationKind {
    /// Only associations resolving to at most one row can be joined for sorting.
    pub fn is_single_row(&self) -> bool {
        matches!(self, AssociationKind::BelongsTo | AssociationKind::HasOne)
    }
}

#[derive(Debug, Clone)]
pub struct Association {
    pub alias: String,
    pub kind: AssociationKind,
    /// For `BelongsTo` a column on the owning entity; otherwise a column on the target.
    pub foreign_key: String,
    pub target: Arc<EntitySchema>,
}

/// Static description of an entity: its table, columns and associations.
///
/// Lookups by column name or association alias are case-insensitive through
/// lowercase indexes built as the descriptor is assembled. When two names
/// differ only by case the first one declared wins.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    name: String,
    table: String,
    primary_key: String,
    columns: Vec<Column>,
    column_index: HashMap<String, usize>,
    associations: Vec<Association>,
    association_index: HashMap<String, usize>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            columns: vec![],
            column_index: HashMap::new(),
            associations: vec![],
            association_index: HashMap::new(),
        }
    }

    /// Declare a column whose database name is the snake_case form of `name`.
    pub fn column(self, name: &str, column_type: ColumnType) -> Self {
        let db_name = to_snake_case(name);
        self.column_as(name, db_name, column_type)
    }

    pub fn column_as(mut self, name: impl Into<String>, db_name: impl Into<String>, column_type: ColumnType) -> Self {
        let column = Column { name: name.into(), db_name: db_name.into(), column_type };
        self.column_index
            .entry(column.name.to_lowercase())
            .or_insert(self.columns.len());
        self.columns.push(column);
        self
    }

    /// `createdAt`, `updatedAt` and the soft-delete marker `deletedAt`.
    pub fn timestamps(self) -> Self {
        self.column("createdAt", ColumnType::Timestamp)
            .column("updatedAt", ColumnType::Timestamp)
            .column("deletedAt", ColumnType::Timestamp)
    }

    pub fn belongs_to(self, alias: &str, foreign_key: &str, target: Arc<EntitySchema>) -> Self {
        self.associate(alias, AssociationKind::BelongsTo, foreign_key, target)
    }

    pub fn has_one(self, alias: &str, foreign_key: &str, target: Arc<EntitySchema>) -> Self {
        self.associate(alias, AssociationKind::HasOne, foreign_key, target)
    }

    pub fn has_many(self, alias: &str, foreign_key: &str, target: Arc<EntitySchema>) -> Self {
        self.associate(alias, AssociationKind::HasMany, foreign_key, target)
    }

    fn associate(mut self, alias: &str, kind: AssociationKind, foreign_key: &str, target: Arc<EntitySchema>) -> Self {
        self.association_index
            .entry(alias.to_lowercase())
            .or_insert(self.associations.len());
        self.associations.push(Association {
            alias: alias.to_string(),
            kind,
            foreign_key: foreign_key.to_string(),
            target,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.column_index
            .get(&name.to_lowercase())
            .map(|&idx| &self.columns[idx])
    }

    pub fn find_association(&self, alias: &str) -> Option<&Association> {
        self.association_index
            .get(&alias.to_lowercase())
            .map(|&idx| &self.associations[idx])
    }

    /// Present when the entity declares `deletedAt`.
    pub fn soft_delete_column(&self) -> Option<&Column> {
        self.find_column("deletedAt")
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category() -> Arc<EntitySchema> {
        Arc::new(
            EntitySchema::new("ProductCategory", "product_categories")
                .column("id", ColumnType::Uuid)
                .column("name", ColumnType::Text)
                .timestamps(),
        )
    }

    #[test]
    fn derives_snake_case_database_names() {
        let schema = EntitySchema::new("Product", "products")
            .column("stockQuantity", ColumnType::Integer)
            .column("imageUrl", ColumnType::Text);
        assert_eq!(schema.find_column("stockQuantity").unwrap().db_name, "stock_quantity");
        assert_eq!(schema.find_column("imageUrl").unwrap().db_name, "image_url");
    }

    #[test]
    fn column_lookup_ignores_case_and_keeps_declared_casing() {
        let schema = EntitySchema::new("Product", "products").column("stockQuantity", ColumnType::Integer);
        let column = schema.find_column("STOCKQUANTITY").unwrap();
        assert_eq!(column.name, "stockQuantity");
        assert!(schema.find_column("stock").is_none());
    }

    #[test]
    fn association_lookup_ignores_case() {
        let schema = EntitySchema::new("Product", "products").belongs_to("category", "categoryId", category());
        let association = schema.find_association("Category").unwrap();
        assert_eq!(association.alias, "category");
        assert!(association.kind.is_single_row());
        assert!(association.target.find_column("NAME").is_some());
    }

    #[test]
    fn has_many_is_not_single_row() {
        assert!(!AssociationKind::HasMany.is_single_row());
        assert!(AssociationKind::HasOne.is_single_row());
    }

    #[test]
    fn timestamps_declare_soft_delete_marker() {
        let schema = EntitySchema::new("User", "users").timestamps();
        assert_eq!(schema.soft_delete_column().unwrap().db_name, "deleted_at");
    }
}
