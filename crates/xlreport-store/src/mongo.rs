//! MongoDB backend

use bson::Document;
use mongodb::sync::{Client, Database};
use tracing::debug;
use xlreport_core::{DocumentStore, Query, StoreError, StoreSettings, Update};

/// Store backed by one MongoDB database.
#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Create a client for `uri` and select `database`.
    ///
    /// The driver connects lazily; an unreachable server surfaces on the
    /// first operation.
    pub fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).map_err(|e| StoreError::Connection(e.to_string()))?;
        debug!(database, "mongodb client created");
        Ok(Self {
            db: client.database(database),
        })
    }

    pub fn from_settings(settings: &StoreSettings) -> Result<Self, StoreError> {
        Self::connect(&settings.uri, &settings.database)
    }

    pub fn database_name(&self) -> &str {
        self.db.name()
    }
}

impl DocumentStore for MongoStore {
    fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let filter = query.to_document();
        debug!(collection, filter = %filter, "find");
        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(filter)
            .run()
            .map_err(|e| StoreError::backend(collection, e.to_string()))?;
        cursor
            .map(|doc| doc.map_err(|e| StoreError::backend(collection, e.to_string())))
            .collect()
    }

    fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        self.db
            .collection::<Document>(collection)
            .insert_one(doc)
            .run()
            .map_err(|e| StoreError::backend(collection, e.to_string()))?;
        Ok(())
    }

    fn update_one(&self, collection: &str, query: &Query, update: &Update) -> Result<u64, StoreError> {
        let filter = query.to_document();
        let changes = update.to_document();
        debug!(collection, filter = %filter, update = %changes, "update_one");
        let result = self
            .db
            .collection::<Document>(collection)
            .update_one(filter, changes)
            .run()
            .map_err(|e| StoreError::backend(collection, e.to_string()))?;
        Ok(result.matched_count)
    }
}
