//! In-memory backend
//!
//! Collections are plain vectors behind a mutex. Queries are evaluated with
//! `Query::matches`, so results follow the same semantics the MongoDB filter
//! document expresses. Individual operations can be told to fail, which is
//! how error paths are exercised without a server.

use bson::Document;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use xlreport_core::{DocumentStore, Query, StoreError, Update};

/// Store operation kinds, for failure injection and the call log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Find,
    Insert,
    Update,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
    failing: Mutex<HashSet<(String, Operation)>>,
    log: Mutex<Vec<(Operation, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append documents to a collection.
    pub fn seed(&self, collection: &str, docs: impl IntoIterator<Item = Document>) {
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    pub fn with(self, collection: &str, docs: impl IntoIterator<Item = Document>) -> Self {
        self.seed(collection, docs);
        self
    }

    /// Snapshot of a collection.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        lock(&self.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        lock(&self.collections).get(collection).map_or(0, Vec::len)
    }

    /// Make every `op` on `collection` fail from now on.
    pub fn fail_on(&self, collection: &str, op: Operation) {
        lock(&self.failing).insert((collection.to_string(), op));
    }

    /// Operations performed so far, in order.
    pub fn operations(&self) -> Vec<(Operation, String)> {
        lock(&self.log).clone()
    }

    pub fn count_operations(&self, op: Operation) -> usize {
        lock(&self.log).iter().filter(|(o, _)| *o == op).count()
    }

    fn record(&self, op: Operation, collection: &str) -> Result<(), StoreError> {
        lock(&self.log).push((op, collection.to_string()));
        if lock(&self.failing).contains(&(collection.to_string(), op)) {
            return Err(StoreError::backend(collection, format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DocumentStore for MemoryStore {
    fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.record(Operation::Find, collection)?;
        Ok(lock(&self.collections)
            .get(collection)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        self.record(Operation::Insert, collection)?;
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        Ok(())
    }

    fn update_one(&self, collection: &str, query: &Query, update: &Update) -> Result<u64, StoreError> {
        self.record(Operation::Update, collection)?;
        let mut collections = lock(&self.collections);
        let Some(target) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| query.matches(d)))
        else {
            return Ok(0);
        };
        update.apply_to(target);
        Ok(1)
    }
}
