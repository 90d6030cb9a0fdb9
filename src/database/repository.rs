use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewProduct, NewUser, ProductCategory, ProductListItem, User};
use crate::database::query_builder::QueryBuilder;
use crate::database::schemas::schemas;
use crate::query::{FilterSpec, Pagination, SortKey, Statement};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password, phone_number, avatar, is_active, \
     is_verified, last_login_at, created_at, updated_at, deleted_at";

/// Resolved listing request handed to a [`ProductStore`].
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub filter: FilterSpec,
    pub sort: SortKey,
    pub pagination: Pagination,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Live (not soft-deleted) user with exactly this email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn email_exists(&self, email: &str) -> Result<bool, DatabaseError>;

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn record_login(&self, id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// One page of products plus the total number of matches.
    async fn find_and_count(&self, query: &ProductQuery) -> Result<(Vec<ProductListItem>, u64), DatabaseError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, email, password, phone_number, avatar)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone_number)
        .bind(&user.avatar)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            // Unique index also covers soft-deleted rows
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DatabaseError::Conflict("Email already registered".to_string()))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn record_login(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Listing statement: the list-item projection joined with the category.
    pub fn listing_statement(query: &ProductQuery) -> Result<Statement<'static>, DatabaseError> {
        let mut statement = Statement::new(&schemas().products)?;
        for column in ["id", "name", "price", "stockQuantity", "categoryId", "sku", "createdAt"] {
            statement.select(column)?;
        }
        statement
            .select_as("category.name", "category_name")?
            .filter(query.filter.clone())?
            .order(query.sort.clone())?
            .paginate(query.pagination);
        Ok(statement)
    }

    pub async fn categories(&self) -> Result<Vec<ProductCategory>, DatabaseError> {
        let rows = sqlx::query_as::<_, ProductCategory>(
            "SELECT id, name, description, is_active, created_at, updated_at, deleted_at
             FROM product_categories WHERE deleted_at IS NULL ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert a category unless one with the same name exists; returns its id.
    pub async fn upsert_category(&self, name: &str, description: &str) -> Result<Uuid, DatabaseError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO product_categories (name, description) VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description, updated_at = NOW()
             RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Insert a product; an existing SKU is left untouched. Returns whether a row was added.
    pub async fn insert_product(&self, product: &NewProduct) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO products (category_id, name, description, price, stock_quantity, sku, image_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (sku) DO NOTHING",
        )
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock_quantity)
        .bind(&product.sku)
        .bind(&product.image_url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_and_count(&self, query: &ProductQuery) -> Result<(Vec<ProductListItem>, u64), DatabaseError> {
        let builder = QueryBuilder::<ProductListItem>::new(Self::listing_statement(query)?);
        let (items, total) = tokio::try_join!(builder.select_all(&self.pool), builder.count(&self.pool))?;
        Ok((items, u64::try_from(total).unwrap_or(0)))
    }
}
