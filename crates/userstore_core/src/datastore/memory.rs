//! In-memory datastore.
//!
//! Strongly consistent: a `put` is visible to the next `query_all`. Used as
//! the test backend and for throwaway contexts.

use super::{Datastore, DatastoreError, DatastoreResult, Entity, Key, Properties};
use crate::context::ExecutionScope;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct MemoryDatastore {
    entities: RwLock<BTreeMap<Key, Properties>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities across all kinds.
    pub fn len(&self) -> DatastoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> DatastoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> DatastoreResult<RwLockReadGuard<'_, BTreeMap<Key, Properties>>> {
        self.entities
            .read()
            .map_err(|_| DatastoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> DatastoreResult<RwLockWriteGuard<'_, BTreeMap<Key, Properties>>> {
        self.entities
            .write()
            .map_err(|_| DatastoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl Datastore for MemoryDatastore {
    fn get(&self, scope: &ExecutionScope, key: &Key) -> DatastoreResult<Option<Entity>> {
        scope.check()?;
        key.validate()?;
        Ok(self.read()?.get(key).map(|properties| Entity {
            key: key.clone(),
            properties: properties.clone(),
        }))
    }

    fn put(&self, scope: &ExecutionScope, entity: &Entity) -> DatastoreResult<Key> {
        scope.check()?;
        entity.key.validate()?;
        self.write()?.insert(entity.key.clone(), entity.properties.clone());
        Ok(entity.key.clone())
    }

    fn delete(&self, scope: &ExecutionScope, key: &Key) -> DatastoreResult<()> {
        scope.check()?;
        key.validate()?;
        self.write()?.remove(key);
        Ok(())
    }

    fn query_all(&self, scope: &ExecutionScope, kind: &str) -> DatastoreResult<Vec<Entity>> {
        scope.check()?;
        Ok(self
            .read()?
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .map(|(key, properties)| Entity {
                key: key.clone(),
                properties: properties.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryDatastore;
    use crate::context::ExecutionScope;
    use crate::datastore::{Datastore, DatastoreError, Entity, Key, Properties};
    use serde_json::json;

    fn entity(kind: &str, name: &str) -> Entity {
        let mut properties = Properties::new();
        properties.insert("Name".into(), json!(name));
        Entity {
            key: Key::new(kind, name),
            properties,
        }
    }

    #[test]
    fn put_get_delete_cycle() {
        let store = MemoryDatastore::new();
        let scope = ExecutionScope::new();
        let stored = entity("User", "a@b.c");

        store.put(&scope, &stored).unwrap();
        assert_eq!(store.get(&scope, &stored.key).unwrap(), Some(stored.clone()));

        store.delete(&scope, &stored.key).unwrap();
        assert_eq!(store.get(&scope, &stored.key).unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn delete_missing_key_succeeds() {
        let store = MemoryDatastore::new();
        store
            .delete(&ExecutionScope::new(), &Key::new("User", "ghost"))
            .unwrap();
    }

    #[test]
    fn query_all_filters_by_kind() {
        let store = MemoryDatastore::new();
        let scope = ExecutionScope::new();
        store.put(&scope, &entity("User", "a")).unwrap();
        store.put(&scope, &entity("User", "b")).unwrap();
        store.put(&scope, &entity("Team", "c")).unwrap();

        let users = store.query_all(&scope, "User").unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|e| e.key.kind == "User"));
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn cancelled_scope_blocks_writes() {
        let store = MemoryDatastore::new();
        let scope = ExecutionScope::new();
        scope.cancel();

        let err = store.put(&scope, &entity("User", "a")).unwrap_err();
        assert!(matches!(err, DatastoreError::Cancelled));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn poisoned_lock_reports_unavailable() {
        let store = MemoryDatastore::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.entities.write().unwrap();
            panic!("poison the lock");
        }));
        assert!(result.is_err());

        assert!(matches!(store.len(), Err(DatastoreError::Unavailable(_))));
        assert!(matches!(
            store.is_empty(),
            Err(DatastoreError::Unavailable(_))
        ));
    }
}
