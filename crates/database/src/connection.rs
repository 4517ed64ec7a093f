use crate::error::DbError;
use chrono::{DateTime, NaiveDate, Utc};
use configuration::DatabaseSettings;
use futures_util::future::BoxFuture;
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgConnection, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// A positional parameter for [`Database::query`] and [`Database::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl SqlParam {
    fn bind_to<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Uuid(v) => query.bind(*v),
            SqlParam::Decimal(v) => query.bind(*v),
            SqlParam::Date(v) => query.bind(*v),
            SqlParam::Timestamp(v) => query.bind(*v),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<Uuid> for SqlParam {
    fn from(v: Uuid) -> Self {
        SqlParam::Uuid(v)
    }
}

impl From<Decimal> for SqlParam {
    fn from(v: Decimal) -> Self {
        SqlParam::Decimal(v)
    }
}

/// The process-wide gateway to PostgreSQL.
///
/// Built once at start-up with [`Database::connect`] and handed to whoever
/// needs it; clones share the same pool. Failed statements are logged here
/// and returned to the caller untouched. There is no retry policy.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Creates the connection pool described by `settings`.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DbError> {
        if settings.max_connections == 0 {
            return Err(DbError::ConnectionConfigError(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .idle_timeout(settings.idle_timeout())
            .acquire_timeout(settings.connection_timeout())
            .connect(&settings.connection_url())
            .await
            .inspect_err(|_| tracing::warn!(host = %settings.host, "Unable to connect to the database."))?;

        tracing::info!(
            host = %settings.host,
            database = %settings.name,
            max_connections = settings.max_connections,
            "Database connection established"
        );
        Ok(Self { pool })
    }

    /// Wraps an existing pool, e.g. one created by a test harness.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs a parameterized statement on a pooled connection and returns its rows.
    ///
    /// The connection goes back to the pool whether the statement succeeds or not.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<PgRow>, DbError> {
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, param| param.bind_to(query));

        query
            .fetch_all(&self.pool)
            .await
            .inspect_err(|_| tracing::debug!(sql, "Failed statement"))
            .map_err(DbError::from)
    }

    /// Like [`Database::query`], but returns the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, DbError> {
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, param| param.bind_to(query));

        let result = query
            .execute(&self.pool)
            .await
            .inspect_err(|_| tracing::debug!(sql, "Failed statement"))?;
        Ok(result.rows_affected())
    }

    /// Runs `callback` inside a single database transaction.
    ///
    /// Issues `BEGIN`, hands the callback the transaction's connection, and
    /// `COMMIT`s if it returns `Ok`. On `Err` the transaction is rolled back
    /// and the callback's error is returned. The connection is released in
    /// every case.
    ///
    /// ```ignore
    /// db.transaction(|conn| Box::pin(async move {
    ///     sqlx::query("UPDATE farms SET is_active = FALSE WHERE id = $1")
    ///         .bind(farm_id)
    ///         .execute(&mut *conn)
    ///         .await?;
    ///     Ok(())
    /// })).await?;
    /// ```
    pub async fn transaction<T, F>(&self, callback: F) -> Result<T, DbError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DbError>> + Send,
    {
        let mut tx = self.pool.begin().await?;

        match callback(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tracing::error!(error = %err, "Transaction error, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Applies the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        // Use a relative path from the crate root
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Closes every pooled connection. Further calls fail with a pool-closed error.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_convert_from_plain_values() {
        let id = Uuid::new_v4();
        let params: Vec<SqlParam> = vec!["Lucero".into(), 42_i64.into(), true.into(), id.into()];
        assert_eq!(
            params,
            vec![
                SqlParam::Text("Lucero".to_string()),
                SqlParam::Int(42),
                SqlParam::Bool(true),
                SqlParam::Uuid(id),
            ]
        );
    }

    #[tokio::test]
    async fn unreachable_pool_yields_query_error() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://postgres@127.0.0.1:1/bovitrack")
            .unwrap();
        let db = Database::from_pool(pool);

        let result = db.query("SELECT 1", &[]).await;
        assert!(matches!(result, Err(DbError::Query(_))));

        let repo = crate::DbRepository::new(db);
        assert!(matches!(repo.list_fincas(false).await, Err(DbError::Query(_))));
    }

    #[tokio::test]
    async fn connect_rejects_empty_pool() {
        let settings = configuration::load_settings_from(|var| {
            (var == "DB_POOL_MAX").then(|| "1".to_string())
        })
        .unwrap();
        let mut settings = settings.database;
        settings.max_connections = 0;

        let result = Database::connect(&settings).await;
        assert!(matches!(result, Err(DbError::ConnectionConfigError(_))));
    }
}
