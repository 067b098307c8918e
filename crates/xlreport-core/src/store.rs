//! Document store abstraction

use bson::Document;

use crate::error::StoreError;
use crate::query::{Query, Update};

/// Handle to the active database.
///
/// Created once by the caller and passed by reference to the dispatcher and
/// report builders. All calls block until the backend answers.
pub trait DocumentStore {
    /// All documents in `collection` matching `query`, in natural order.
    fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Insert one document.
    fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError>;

    /// Update the first document matching `query`; returns how many matched (0 or 1).
    fn update_one(&self, collection: &str, query: &Query, update: &Update) -> Result<u64, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        (**self).find(collection, query)
    }

    fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        (**self).insert_one(collection, doc)
    }

    fn update_one(&self, collection: &str, query: &Query, update: &Update) -> Result<u64, StoreError> {
        (**self).update_one(collection, query, update)
    }
}
