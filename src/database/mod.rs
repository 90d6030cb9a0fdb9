pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod schemas;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{PgProductStore, PgUserStore, ProductQuery, ProductStore, UserStore};
