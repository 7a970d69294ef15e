//! Key/kind datastore capability and its implementations.
//!
//! # Responsibility
//! - Define the narrow `get/put/delete/query_all` contract the service needs.
//! - Keep storage engine details (SQLite, in-memory) behind that contract.
//!
//! # Invariants
//! - Entities are addressed by `(kind, name)`; both parts are non-empty.
//! - `put` overwrites silently; `delete` of a missing key succeeds.
//! - Every call checks the caller's `ExecutionScope` before touching storage.

use crate::context::ExecutionScope;
use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryDatastore;
pub use sqlite::SqliteDatastore;

/// Named property bag stored for one entity.
pub type Properties = serde_json::Map<String, serde_json::Value>;

pub type DatastoreResult<T> = Result<T, DatastoreError>;

/// Entity address: kind plus string key name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    pub kind: String,
    pub name: String,
}

impl Key {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Rejects keys with an empty kind or name.
    pub fn validate(&self) -> DatastoreResult<()> {
        if self.kind.is_empty() {
            return Err(DatastoreError::InvalidKey("kind must not be empty".into()));
        }
        if self.name.is_empty() {
            return Err(DatastoreError::InvalidKey(format!(
                "name must not be empty for kind `{}`",
                self.kind
            )));
        }
        Ok(())
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// One stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: Key,
    pub properties: Properties,
}

/// Storage-side failure. Surfaced to service callers unchanged.
#[derive(Debug)]
pub enum DatastoreError {
    Db(DbError),
    Codec(serde_json::Error),
    InvalidKey(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    Unavailable(String),
    Cancelled,
    DeadlineExceeded,
}

impl Display for DatastoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::InvalidKey(message) => write!(f, "invalid datastore key: {message}"),
            Self::InvalidData(message) => write!(f, "invalid stored entity data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "entity store connection is at schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "entity store is missing required table `{table}`")
            }
            Self::Unavailable(message) => write!(f, "datastore unavailable: {message}"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

impl Error for DatastoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DatastoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DatastoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for DatastoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// Minimal storage capability used by the service layer.
///
/// Implementations must be safe to share across threads; callers hold one
/// long-lived handle and borrow it per request.
pub trait Datastore: Send + Sync {
    fn get(&self, scope: &ExecutionScope, key: &Key) -> DatastoreResult<Option<Entity>>;
    fn put(&self, scope: &ExecutionScope, entity: &Entity) -> DatastoreResult<Key>;
    fn delete(&self, scope: &ExecutionScope, key: &Key) -> DatastoreResult<()>;
    /// Returns every entity of `kind`. Order is implementation-defined.
    fn query_all(&self, scope: &ExecutionScope, kind: &str) -> DatastoreResult<Vec<Entity>>;
}

#[cfg(test)]
mod tests {
    use super::{DatastoreError, Key};

    #[test]
    fn key_validate_rejects_empty_parts() {
        assert!(matches!(
            Key::new("", "a").validate(),
            Err(DatastoreError::InvalidKey(_))
        ));
        assert!(matches!(
            Key::new("User", "").validate(),
            Err(DatastoreError::InvalidKey(_))
        ));
        assert!(Key::new("User", "a@b.c").validate().is_ok());
    }

    #[test]
    fn key_display_joins_kind_and_name() {
        assert_eq!(Key::new("User", "a@b.c").to_string(), "User/a@b.c");
    }
}
