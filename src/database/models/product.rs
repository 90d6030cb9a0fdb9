use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub sku: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Projection returned by the product listing, flattened with the category name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductListItem {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Uuid,
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub category_name: Option<String>,
}

/// Insert payload used by the seeder.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub sku: String,
    pub image_url: Option<String>,
}
