//! In-memory collection state shared by both store backends.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::store::{Document, DocumentId, StoredDocument, WriteOutcome};

/// Field holding the store-assigned id on disk.
const ID_FIELD: &str = "_id";
/// Where an `_id` supplied by the caller is kept instead.
pub(crate) const SOURCE_ID_FIELD: &str = "sourceId";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Collection {
    next_id: u64,
    documents: Vec<StoredDocument>,
}

impl Collection {
    pub(crate) fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    pub(crate) fn insert(&mut self, fields: Document) -> DocumentId {
        // Ids start at 1 and never repeat within a collection.
        self.next_id += 1;
        let id = DocumentId(self.next_id);
        self.documents.push(StoredDocument {
            id,
            fields: move_foreign_id(fields),
        });
        id
    }

    pub(crate) fn upsert(&mut self, filter: &dyn Fn(&Document) -> bool, fields: Document) -> WriteOutcome {
        match self.documents.iter_mut().find(|d| filter(&d.fields)) {
            Some(existing) => {
                existing.fields = move_foreign_id(fields);
                WriteOutcome::Replaced(existing.id)
            }
            None => WriteOutcome::Inserted(self.insert(fields)),
        }
    }

    pub(crate) fn set_fields(&mut self, name: &str, id: DocumentId, fields: Document) -> Result<(), StorageError> {
        let doc = self
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StorageError::NotFound {
                collection: name.to_string(),
                id: id.0,
            })?;
        doc.fields.extend(move_foreign_id(fields));
        Ok(())
    }
}

/// `_id` is owned by the store. A caller-supplied one (e.g. from a database
/// export) is kept under `sourceId` so the serialized document has one `_id`.
fn move_foreign_id(mut fields: Document) -> Document {
    if let Some(foreign) = fields.remove(ID_FIELD) {
        fields.entry(SOURCE_ID_FIELD).or_insert(foreign);
    }
    fields
}
