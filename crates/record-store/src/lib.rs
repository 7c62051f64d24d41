//! Keyed record tables.
//!
//! Each entity of the fulfillment workflow lives in its own logical table,
//! keyed by the order identifier. A table only supports whole-record reads and
//! writes; there are no secondary indexes and no multi-key transactions.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod table;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use memory::InMemoryTable;
pub use postgres::{PostgresTable, run_migrations};
pub use record::{Record, TableName};
pub use table::{RecordTable, RecordTableExt};
