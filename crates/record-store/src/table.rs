use std::sync::Arc;

use async_trait::async_trait;

use crate::{OrderId, Record, Result, StoreError};

/// Core trait for record table implementations.
///
/// A table holds at most one record per order identifier. Every call is a
/// single bounded request against the backing store; implementations never
/// retry. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RecordTable<R: Record>: Send + Sync {
    /// Returns the logical name of the table.
    fn table_name(&self) -> &str;

    /// Loads the record stored under `key`.
    ///
    /// Returns None if no record exists.
    async fn get(&self, key: &OrderId) -> Result<Option<R>>;

    /// Stores the record under its key, replacing any existing record.
    async fn put(&self, record: &R) -> Result<()>;
}

#[async_trait]
impl<R, T> RecordTable<R> for Arc<T>
where
    R: Record,
    T: RecordTable<R> + ?Sized,
{
    fn table_name(&self) -> &str {
        (**self).table_name()
    }

    async fn get(&self, key: &OrderId) -> Result<Option<R>> {
        (**self).get(key).await
    }

    async fn put(&self, record: &R) -> Result<()> {
        (**self).put(record).await
    }
}

/// Extension trait providing convenience methods for record tables.
#[async_trait]
pub trait RecordTableExt<R: Record>: RecordTable<R> {
    /// Loads the record stored under `key`, failing with `NotFound` if absent.
    async fn get_required(&self, key: &OrderId) -> Result<R> {
        self.get(key).await?.ok_or_else(|| StoreError::NotFound {
            table: self.table_name().to_string(),
            key: key.clone(),
        })
    }

    /// Checks if a record exists for `key`.
    async fn exists(&self, key: &OrderId) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

// Blanket implementation for all RecordTable implementations
impl<R: Record, T: RecordTable<R> + ?Sized> RecordTableExt<R> for T {}
