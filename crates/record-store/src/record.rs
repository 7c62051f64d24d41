use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{OrderId, Result, StoreError};

/// A record that can be stored in a [`RecordTable`](crate::RecordTable).
///
/// Records are stored as whole documents keyed by the order identifier.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Returns the primary key of the record.
    fn key(&self) -> &OrderId;
}

/// Name of a logical table.
///
/// Table names come from configuration and end up inside SQL statements, so
/// they are restricted to plain identifiers: an ASCII letter or underscore
/// followed by up to 62 ASCII letters, digits or underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validates and wraps a table name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid_start && valid_rest && name.len() <= 63 {
            Ok(Self(name))
        } else {
            Err(StoreError::InvalidTableName(name))
        }
    }

    /// Returns the table name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
