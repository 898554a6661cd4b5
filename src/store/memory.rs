use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::StorageError;
use crate::store::{Collection, Document, DocumentId, DocumentStore, StoredDocument, WriteOutcome};

/// Process-local store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Collection>>, StorageError> {
        self.collections
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn find_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StorageError> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .map(|c| c.documents().to_vec())
            .unwrap_or_default())
    }

    fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<Vec<DocumentId>, StorageError> {
        let mut collections = self.lock()?;
        let c = collections.entry(collection.to_string()).or_default();
        let ids: Vec<DocumentId> = docs.into_iter().map(|d| c.insert(d)).collect();
        debug!(collection, inserted = ids.len(), "inserted documents");
        Ok(ids)
    }

    fn upsert(
        &self,
        collection: &str,
        filter: &dyn Fn(&Document) -> bool,
        doc: Document,
    ) -> Result<WriteOutcome, StorageError> {
        let mut collections = self.lock()?;
        Ok(collections.entry(collection.to_string()).or_default().upsert(filter, doc))
    }

    fn set_fields(&self, collection: &str, id: DocumentId, fields: Document) -> Result<(), StorageError> {
        let mut collections = self.lock()?;
        match collections.get_mut(collection) {
            Some(c) => c.set_fields(collection, id, fields),
            None => Err(StorageError::NotFound {
                collection: collection.to_string(),
                id: id.0,
            }),
        }
    }
}
