use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{OrderId, Record, RecordTable, Result, StoreError};

/// In-memory record table for testing and single-process deployments.
///
/// Records are kept as serialized JSON documents, so a record goes through the
/// same serde round trip as it does in the PostgreSQL implementation.
pub struct InMemoryTable<R> {
    name: Arc<str>,
    rows: Arc<RwLock<HashMap<OrderId, serde_json::Value>>>,
    fail_on_get: Arc<AtomicBool>,
    fail_on_put: Arc<AtomicBool>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for InMemoryTable<R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            rows: Arc::clone(&self.rows),
            fail_on_get: Arc::clone(&self.fail_on_get),
            fail_on_put: Arc::clone(&self.fail_on_put),
            _record: PhantomData,
        }
    }
}

impl<R> InMemoryTable<R> {
    /// Creates a new empty table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            rows: Arc::default(),
            fail_on_get: Arc::default(),
            fail_on_put: Arc::default(),
            _record: PhantomData,
        }
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns true if the table holds no records.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Makes every subsequent `get` fail as if the store were unreachable.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.fail_on_get.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `put` fail as if the store were unreachable.
    pub fn set_fail_on_put(&self, fail: bool) {
        self.fail_on_put.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl<R: Record> RecordTable<R> for InMemoryTable<R> {
    fn table_name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &OrderId) -> Result<Option<R>> {
        if self.fail_on_get.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "get from {} failed",
                self.name
            )));
        }

        let rows = self.rows.read().await;
        rows.get(key)
            .map(|doc| serde_json::from_value(doc.clone()))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn put(&self, record: &R) -> Result<()> {
        if self.fail_on_put.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "put into {} failed",
                self.name
            )));
        }

        let doc = serde_json::to_value(record)?;
        self.rows.write().await.insert(record.key().clone(), doc);
        metrics::counter!("record_store_writes_total", "table" => self.name.to_string())
            .increment(1);
        Ok(())
    }
}
