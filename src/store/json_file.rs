//! File-backed document store.
//!
//! Layout: `<root>/<database>/<collection>.json`, each file holding
//! `{ "next_id": N, "documents": [...] }`. Every mutation rewrites the whole
//! collection through a temporary file followed by a rename, so a crash leaves
//! either the old or the new contents on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::error::StorageError;
use crate::store::{Collection, Document, DocumentId, DocumentStore, StoredDocument, WriteOutcome};

#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: &Path, database: &str) -> Self {
        Self {
            dir: root.join(database),
            guard: Mutex::new(()),
        }
    }

    /// Directory holding this database's collection files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.guard
            .lock()
            .map_err(|_| StorageError::Unavailable("file store lock poisoned".to_string()))
    }

    fn collection_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidCollection(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    fn load(&self, name: &str) -> Result<Collection, StorageError> {
        let path = self.collection_path(name)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Collection::default()),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        trace!(path = %path.display(), bytes = bytes.len(), "read collection file");
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt { path, source })
    }

    fn save(&self, name: &str, collection: &Collection) -> Result<(), StorageError> {
        let path = self.collection_path(name)?;
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let bytes = serde_json::to_vec_pretty(collection).map_err(|source| StorageError::Corrupt {
            path: path.clone(),
            source,
        })?;

        let tmp = self.dir.join(format!(".{name}.json.tmp"));
        fs::write(&tmp, bytes).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        trace!(path = %path.display(), documents = collection.documents().len(), "wrote collection file");
        Ok(())
    }

    fn modify<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Collection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let _guard = self.lock()?;
        let mut collection = self.load(name)?;
        let out = f(&mut collection)?;
        self.save(name, &collection)?;
        Ok(out)
    }
}

impl DocumentStore for JsonFileStore {
    fn find_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StorageError> {
        let _guard = self.lock()?;
        Ok(self.load(collection)?.documents().to_vec())
    }

    fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<Vec<DocumentId>, StorageError> {
        let ids = self.modify(collection, |c| Ok(docs.into_iter().map(|d| c.insert(d)).collect::<Vec<_>>()))?;
        debug!(collection, inserted = ids.len(), "inserted documents");
        Ok(ids)
    }

    fn upsert(
        &self,
        collection: &str,
        filter: &dyn Fn(&Document) -> bool,
        doc: Document,
    ) -> Result<WriteOutcome, StorageError> {
        self.modify(collection, |c| Ok(c.upsert(filter, doc)))
    }

    fn set_fields(&self, collection: &str, id: DocumentId, fields: Document) -> Result<(), StorageError> {
        self.modify(collection, |c| c.set_fields(collection, id, fields))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError {
    let path = path.to_path_buf();
    move |source| StorageError::Io { path, source }
}
