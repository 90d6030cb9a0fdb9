use sqlx::{self, postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::query::{SqlParam, SqlResult, Statement};

/// Executes rendered [`Statement`]s against a pool.
pub struct QueryBuilder<'s, T> {
    statement: Statement<'s>,
    _phantom: std::marker::PhantomData<T>,
}

impl<'s, T> QueryBuilder<'s, T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(statement: Statement<'s>) -> Self {
        Self {
            statement,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.statement.to_sql()?;
        tracing::debug!("select: {}", sql_result.query);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn count(&self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result = self.statement.to_count_sql()?;
        count_rows(pool, &sql_result).await
    }
}

async fn count_rows(pool: &PgPool, sql_result: &SqlResult) -> Result<i64, DatabaseError> {
    tracing::debug!("count: {}", sql_result.query);
    let mut q = sqlx::query(&sql_result.query);
    for p in sql_result.params.iter() {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(pool).await?;
    let count: i64 = row.try_get("count")?;
    Ok(count)
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Float(f) => q.bind(*f),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Bool(b) => q.bind(*b),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Float(f) => q.bind(*f),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Bool(b) => q.bind(*b),
    }
}
