use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{OrderId, Record, RecordTable, Result, TableName};

/// Runs the bundled database migrations (default tables and the queue table).
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// PostgreSQL-backed record table.
///
/// Each row stores the primary key in `order_id` and the whole record as a
/// JSONB document in `item`. Writes are upserts, so `put` replaces the full
/// record just like the in-memory implementation.
pub struct PostgresTable<R> {
    pool: PgPool,
    name: TableName,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PostgresTable<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            name: self.name.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> PostgresTable<R> {
    /// Creates a table handle over an existing connection pool.
    pub fn new(pool: PgPool, name: TableName) -> Self {
        Self {
            pool,
            name,
            _record: PhantomData,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the table if it does not exist yet.
    ///
    /// Needed when the configured table name differs from the ones created
    /// by the bundled migrations.
    pub async fn ensure_table(&self) -> Result<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                order_id TEXT PRIMARY KEY,
                item JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.name
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        tracing::debug!(table = %self.name, "record table ready");
        Ok(())
    }
}

#[async_trait]
impl<R: Record> RecordTable<R> for PostgresTable<R> {
    fn table_name(&self) -> &str {
        self.name.as_str()
    }

    async fn get(&self, key: &OrderId) -> Result<Option<R>> {
        let sql = format!("SELECT item FROM {} WHERE order_id = $1", self.name);
        let doc: Option<serde_json::Value> = sqlx::query_scalar(&sql)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(doc.map(serde_json::from_value).transpose()?)
    }

    async fn put(&self, record: &R) -> Result<()> {
        let doc = serde_json::to_value(record)?;
        let sql = format!(
            r#"
            INSERT INTO {} (order_id, item, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (order_id) DO UPDATE
            SET item = EXCLUDED.item, updated_at = EXCLUDED.updated_at
            "#,
            self.name
        );

        sqlx::query(&sql)
            .bind(record.key().as_str())
            .bind(doc)
            .execute(&self.pool)
            .await?;

        metrics::counter!("record_store_writes_total", "table" => self.name.to_string())
            .increment(1);
        Ok(())
    }
}
