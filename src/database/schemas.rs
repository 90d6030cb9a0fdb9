use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::query::{ColumnType, EntitySchema};

/// Entity descriptors for every table the API queries, built once.
pub struct Schemas {
    pub users: Arc<EntitySchema>,
    pub categories: Arc<EntitySchema>,
    pub products: Arc<EntitySchema>,
}

impl Schemas {
    fn build() -> Self {
        let products_stub = Arc::new(Self::product_columns(EntitySchema::new("Product", "products")));

        let categories = Arc::new(
            EntitySchema::new("ProductCategory", "product_categories")
                .column("id", ColumnType::Uuid)
                .column("name", ColumnType::Text)
                .column("description", ColumnType::Text)
                .column("isActive", ColumnType::Boolean)
                .timestamps()
                .has_many("products", "categoryId", products_stub),
        );

        let products = Arc::new(
            Self::product_columns(EntitySchema::new("Product", "products")).belongs_to(
                "category",
                "categoryId",
                categories.clone(),
            ),
        );

        let users = Arc::new(
            EntitySchema::new("User", "users")
                .column("id", ColumnType::Uuid)
                .column("firstName", ColumnType::Text)
                .column("lastName", ColumnType::Text)
                .column("email", ColumnType::Text)
                .column("password", ColumnType::Text)
                .column("phoneNumber", ColumnType::Text)
                .column("avatar", ColumnType::Text)
                .column("isActive", ColumnType::Boolean)
                .column("isVerified", ColumnType::Boolean)
                .column("lastLoginAt", ColumnType::Timestamp)
                .timestamps(),
        );

        Self { users, categories, products }
    }

    fn product_columns(schema: EntitySchema) -> EntitySchema {
        schema
            .column("id", ColumnType::Uuid)
            .column("categoryId", ColumnType::Uuid)
            .column("name", ColumnType::Text)
            .column("description", ColumnType::Text)
            .column("price", ColumnType::Decimal)
            .column("stockQuantity", ColumnType::Integer)
            .column("sku", ColumnType::Text)
            .column("imageUrl", ColumnType::Text)
            .column("isActive", ColumnType::Boolean)
            .timestamps()
    }
}

pub static SCHEMAS: Lazy<Schemas> = Lazy::new(Schemas::build);

pub fn schemas() -> &'static Schemas {
    &SCHEMAS
}
