//! Document persistence.
//!
//! The pipeline talks to storage only through [`DocumentStore`]: a small set of
//! collection-level operations over schemaless JSON documents. Two backends:
//!
//! - [`MemoryStore`]: process-local, used by tests and dry runs
//! - [`JsonFileStore`]: one JSON file per collection under `<root>/<database>/`
//!
//! Documents carry a store-assigned `_id` that survives field replacement.

mod collection;
mod json_file;
mod memory;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::StoreConfig;
use crate::error::StorageError;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

pub(crate) use collection::Collection;

/// Schemaless document body (field name -> value).
pub type Document = Map<String, Value>;

/// Store-assigned document identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document together with its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub fields: Document,
}

/// Result of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted(DocumentId),
    Replaced(DocumentId),
}

/// Collection-level document storage.
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection`, in insertion order. Missing collections are empty.
    fn find_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StorageError>;

    /// Append documents, returning their new ids in order.
    fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<Vec<DocumentId>, StorageError>;

    /// Replace the fields of the first document matching `filter`, or insert
    /// `doc` when none matches. A replaced document keeps its id.
    fn upsert(
        &self,
        collection: &str,
        filter: &dyn Fn(&Document) -> bool,
        doc: Document,
    ) -> Result<WriteOutcome, StorageError>;

    /// Overwrite (or add) the given fields on one document, leaving others untouched.
    fn set_fields(&self, collection: &str, id: DocumentId, fields: Document) -> Result<(), StorageError>;
}

/// Open the file-backed store described by `config`.
pub fn open(config: &StoreConfig) -> JsonFileStore {
    JsonFileStore::new(&config.root, &config.database)
}

/// Serialize a typed value into a document body.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Document::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}
