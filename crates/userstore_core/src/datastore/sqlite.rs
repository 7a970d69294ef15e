//! SQLite-backed datastore.
//!
//! # Responsibility
//! - Persist entities as JSON property bags keyed by `(kind, name)`.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Only connections migrated to the latest schema are accepted.
//! - Stored properties must decode to a JSON object; anything else is
//!   reported as invalid data instead of being masked.

use super::{Datastore, DatastoreError, DatastoreResult, Entity, Key, Properties};
use crate::context::ExecutionScope;
use crate::db::migrations::{current_version, latest_version};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const ENTITIES_TABLE: &str = "entities";

/// Entity store over one SQLite connection.
///
/// The connection sits behind a mutex so a single long-lived handle can be
/// shared by concurrent request contexts.
#[derive(Debug)]
pub struct SqliteDatastore {
    conn: Mutex<Connection>,
}

impl SqliteDatastore {
    /// Opens a file-backed store, creating and migrating it as needed.
    pub fn open(path: impl AsRef<Path>) -> DatastoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> DatastoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Wraps an existing connection after checking its schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` when the `entities` table is absent.
    pub fn try_new(conn: Connection) -> DatastoreResult<Self> {
        let actual_version = current_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(DatastoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [ENTITIES_TABLE],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(DatastoreError::MissingRequiredTable(ENTITIES_TABLE));
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> DatastoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DatastoreError::Unavailable("sqlite connection lock poisoned".into()))
    }
}

impl Datastore for SqliteDatastore {
    fn get(&self, scope: &ExecutionScope, key: &Key) -> DatastoreResult<Option<Entity>> {
        scope.check()?;
        key.validate()?;

        let raw: Option<String> = self
            .lock()?
            .query_row(
                "SELECT properties FROM entities WHERE kind = ?1 AND name = ?2;",
                params![key.kind, key.name],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(text) => Ok(Some(Entity {
                key: key.clone(),
                properties: parse_properties(key, &text)?,
            })),
            None => Ok(None),
        }
    }

    fn put(&self, scope: &ExecutionScope, entity: &Entity) -> DatastoreResult<Key> {
        scope.check()?;
        entity.key.validate()?;

        let encoded = serde_json::to_string(&entity.properties)?;
        self.lock()?.execute(
            "INSERT INTO entities (kind, name, properties, updated_at)
             VALUES (?1, ?2, ?3, CAST(unixepoch('subsec') * 1000 AS INTEGER))
             ON CONFLICT (kind, name) DO UPDATE SET
                properties = excluded.properties,
                updated_at = excluded.updated_at;",
            params![entity.key.kind, entity.key.name, encoded],
        )?;
        debug!("event=entity_put module=datastore kind={}", entity.key.kind);
        Ok(entity.key.clone())
    }

    fn delete(&self, scope: &ExecutionScope, key: &Key) -> DatastoreResult<()> {
        scope.check()?;
        key.validate()?;

        let removed = self.lock()?.execute(
            "DELETE FROM entities WHERE kind = ?1 AND name = ?2;",
            params![key.kind, key.name],
        )?;
        debug!(
            "event=entity_delete module=datastore kind={} removed={removed}",
            key.kind
        );
        Ok(())
    }

    fn query_all(&self, scope: &ExecutionScope, kind: &str) -> DatastoreResult<Vec<Entity>> {
        scope.check()?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, properties
             FROM entities
             WHERE kind = ?1
             ORDER BY name ASC;",
        )?;
        let rows = stmt.query_map([kind], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entities = Vec::new();
        for row in rows {
            let (name, text) = row?;
            let key = Key::new(kind, name);
            let properties = parse_properties(&key, &text)?;
            entities.push(Entity { key, properties });
        }
        Ok(entities)
    }
}

fn parse_properties(key: &Key, text: &str) -> DatastoreResult<Properties> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(DatastoreError::InvalidData(format!(
            "properties for `{key}` must be an object, got `{other}`"
        ))),
    }
}
