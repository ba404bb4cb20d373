//! In-memory storage.
//!
//! Slots hold serialized JSON, like a browser's local storage would, so a
//! round trip exercises the same encode and parse paths as the file backend.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::document::Document;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Volatile key/value slots for tests and sessions without a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw payload under `id`, bypassing serialization.
    pub fn insert_raw(&self, id: &str, payload: impl Into<String>) -> StorageResult<()> {
        self.slots()?.insert(id.to_string(), payload.into());
        Ok(())
    }

    /// The raw payload stored under `id`.
    pub fn raw(&self, id: &str) -> StorageResult<Option<String>> {
        Ok(self.slots()?.get(id).cloned())
    }

    fn slots(&self) -> StorageResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|_| StorageError::Other("memory storage poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let payload = document.to_json();
        Box::pin(async move {
            let payload = payload.map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.slots()?.insert(id, payload);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let id = id.to_string();
        Box::pin(async move {
            let payload = self.slots()?.get(&id).cloned();
            let payload = payload.ok_or(StorageError::NotFound(id))?;
            Document::from_json(&payload).map_err(|e| StorageError::Serialization(e.to_string()))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.slots()?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move { Ok(self.slots()?.keys().cloned().collect()) })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.slots()?.contains_key(&id)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementStyle};
    use crate::storage::test_util::block_on;
    use kurbo::Point;

    fn board() -> Document {
        Document::new(vec![Element::rectangle(Point::ZERO, 10.0, 10.0, ElementStyle::default())])
    }

    #[test]
    fn test_slot_holds_json() {
        let storage = MemoryStorage::new();
        let doc = board();
        block_on(storage.save("board", &doc)).unwrap();

        let raw = storage.raw("board").unwrap().unwrap();
        assert!(raw.contains("\"version\": 1"));
        assert_eq!(block_on(storage.load("board")).unwrap(), doc);
    }

    #[test]
    fn test_missing_slot() {
        let storage = MemoryStorage::new();
        assert!(matches!(block_on(storage.load("nope")), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_slot() {
        let storage = MemoryStorage::new();
        storage.insert_raw("board", "{\"version\": 1, \"elements\": [").unwrap();
        assert!(matches!(
            block_on(storage.load("board")),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_list_is_sorted_and_delete_is_idempotent() {
        let storage = MemoryStorage::new();
        block_on(storage.save("b", &board())).unwrap();
        block_on(storage.save("a", &board())).unwrap();
        assert_eq!(block_on(storage.list()).unwrap(), vec!["a".to_string(), "b".to_string()]);

        block_on(storage.delete("a")).unwrap();
        block_on(storage.delete("a")).unwrap();
        assert!(!block_on(storage.exists("a")).unwrap());
        assert!(block_on(storage.exists("b")).unwrap());
    }
}
