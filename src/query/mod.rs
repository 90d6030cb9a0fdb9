//! Translation of HTTP query strings into validated sort, filter and
//! pagination descriptors, and rendering of those into PostgreSQL.

pub mod error;
pub mod filter;
pub mod pagination;
pub mod params;
pub mod schema;
pub mod sort;
pub mod statement;
pub mod types;

pub use error::QueryError;
pub use filter::{resolve_filters, FilterConfig, FilterRule, FilterSpec, ValueType};
pub use pagination::{format_page, resolve_pagination, PageInfo, PagedResult, Pagination};
pub use params::QueryParams;
pub use schema::{ColumnType, EntitySchema};
pub use sort::{resolve_sort, SortKey};
pub use statement::Statement;
pub use types::{FieldRef, FilterOp, FilterValue, SortDirection, SqlParam, SqlResult};
