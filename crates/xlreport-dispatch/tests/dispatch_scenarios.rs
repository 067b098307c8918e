//! Dispatcher runs against the in-memory store

use bson::{doc, Document};
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::fs;
use tempfile::TempDir;
use xlreport_core::task::fields;
use xlreport_core::{
    Condition, DispatchError, DocumentStore, Query, RuntimeConfig, Settings, StoreError, TaskStatus,
    Update,
};
use xlreport_dispatch::{Dispatcher, LEASE_EXPIRED_MESSAGE};
use xlreport_reports::{catalog, ReportRegistry};
use xlreport_store::{MemoryStore, Operation};

const TASKS: &str = "System_tasks";

fn config(export_dir: &std::path::Path) -> RuntimeConfig {
    let text = format!(
        r#"
[environment]
current = "test"

[store]
uri = "mongodb://localhost:27017"
database = "drs"

[environments.test]
export_dir = "{}"
lease_seconds = 120

[environments.test.templates]
20 = "Incident Detail Export"
23 = "Direct LOD Export"
99 = "Retired Export"
"#,
        export_dir.display().to_string().replace('\\', "\\\\")
    );
    Settings::from_toml_str(&text).unwrap().resolve(None).unwrap()
}

fn task(id: i32, template: impl Into<bson::Bson>, params: Document) -> Document {
    doc! {
        "Task_Id": id,
        "Template_Task_Id": template.into(),
        "task_status": "Open",
        "parameters": params,
    }
}

fn task_by_id(store: &MemoryStore, id: i32) -> Document {
    store
        .documents(TASKS)
        .into_iter()
        .find(|d| d.get_i32("Task_Id").ok() == Some(id))
        .unwrap()
}

fn status_of(store: &MemoryStore, id: i32) -> String {
    task_by_id(store, id).get_str("task_status").unwrap().to_string()
}

fn files_in(dir: &std::path::Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
fn valid_failing_and_unknown_templates() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let store = MemoryStore::new()
        .with(
            TASKS,
            vec![
                task(1, 20, doc! { "status": "Incident Open" }),
                task(2, 23, doc! {}),
                task(3, 99, doc! {}),
            ],
        )
        .with(
            catalog::INCIDENT_LOG,
            vec![doc! { "Incident_Id": "X1", "Incident_Status": "Incident Open" }],
        );
    store.fail_on(catalog::INCIDENT, Operation::Find);
    let registry = ReportRegistry::standard();

    let summary = Dispatcher::new(&store, &cfg, &registry).run().unwrap();

    assert_eq!(summary.seen, 3);
    assert_eq!(summary.claimed, 3);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 2);
    assert!(!summary.is_success());

    let x = task_by_id(&store, 1);
    assert_eq!(x.get_str("task_status").unwrap(), "Complete");
    assert_eq!(
        x.get_str("task_description").unwrap(),
        "Incident Detail Export completed with 0 errors"
    );
    assert_eq!(x.get_str("export_status").unwrap(), "Generated");
    let file_name = x.get_str("export_filename").unwrap();
    assert!(file_name.starts_with("incidents_details_"));
    assert!(dir.path().join(file_name).exists());

    let y = task_by_id(&store, 2);
    assert_eq!(y.get_str("task_status").unwrap(), "Failed");
    assert!(y
        .get_str("task_description")
        .unwrap()
        .starts_with("Direct LOD Export failed: "));
    assert!(y.get_str("task_description").unwrap().contains("injected"));
    assert_eq!(y.get_i32("error_count").unwrap(), 1);
    assert_eq!(y.get_str("export_status").unwrap(), "Failed");

    let z = task_by_id(&store, 3);
    assert_eq!(z.get_str("task_status").unwrap(), "Failed");
    assert_eq!(
        z.get_str("task_description").unwrap(),
        "Retired Export failed: no report registered for template 99"
    );

    assert_eq!(files_in(dir.path()), 1);
}

#[test]
fn validation_failure_is_recorded_on_task() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let store = MemoryStore::new().with(TASKS, vec![task(7, 20, doc! { "status": "Pending" })]);
    let registry = ReportRegistry::standard();

    let summary = Dispatcher::new(&store, &cfg, &registry).run().unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(status_of(&store, 7), "Failed");
    let description = task_by_id(&store, 7).get_str("task_description").unwrap().to_string();
    assert!(description.contains("Invalid status: 'Pending'"), "{description}");
    assert_eq!(files_in(dir.path()), 0);
}

#[test]
fn no_matching_tasks_means_no_side_effects() {
    let dir = TempDir::new().unwrap();
    let export_dir = dir.path().join("exports");
    let cfg = config(&export_dir);
    let mut done = task(1, 20, doc! {});
    done.insert("task_status", "Complete");
    let store = MemoryStore::new().with(TASKS, vec![done, task(2, 37, doc! {})]);
    let registry = ReportRegistry::standard();

    let summary = Dispatcher::new(&store, &cfg, &registry).run().unwrap();

    assert_eq!(summary.seen, 0);
    assert!(summary.is_success());
    assert_eq!(store.count_operations(Operation::Update), 0);
    assert_eq!(store.count_operations(Operation::Insert), 0);
    assert!(!export_dir.exists());
    assert_eq!(status_of(&store, 2), "Open");
}

#[test]
fn string_template_ids_are_dispatched() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let store = MemoryStore::new().with(TASKS, vec![task(4, "20", doc! {})]);
    let registry = ReportRegistry::standard();

    let summary = Dispatcher::new(&store, &cfg, &registry).run().unwrap();

    assert_eq!(summary.completed, 1);
    assert!(summary.is_success());
    assert_eq!(status_of(&store, 4), "Complete");
}

#[test]
fn claim_stamps_lease() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let store = MemoryStore::new().with(TASKS, vec![task(5, 20, doc! {})]);
    let registry = ReportRegistry::standard();
    let before = Utc::now();

    Dispatcher::new(&store, &cfg, &registry).run().unwrap();

    let lease = task_by_id(&store, 5).get_datetime(fields::LEASE).unwrap().to_chrono();
    assert!(lease >= before + Duration::seconds(119));
    assert!(lease <= Utc::now() + Duration::seconds(121));
}

/// Another dispatcher claims every polled task right after our poll.
struct RacingStore {
    inner: MemoryStore,
}

impl DocumentStore for RacingStore {
    fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let found = self.inner.find(collection, query)?;
        if collection == TASKS {
            for doc in &found {
                let id = doc.get("Task_Id").cloned().unwrap();
                self.inner.update_one(
                    collection,
                    &Query::new().with("Task_Id", Condition::eq(id)),
                    &Update::new().set("task_status", TaskStatus::InProgress),
                )?;
            }
        }
        Ok(found)
    }

    fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        self.inner.insert_one(collection, doc)
    }

    fn update_one(&self, collection: &str, query: &Query, update: &Update) -> Result<u64, StoreError> {
        self.inner.update_one(collection, query, update)
    }
}

#[test]
fn task_claimed_elsewhere_is_skipped() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let store = RacingStore {
        inner: MemoryStore::new().with(TASKS, vec![task(6, 20, doc! {})]),
    };
    let registry = ReportRegistry::standard();

    let summary = Dispatcher::new(&store, &cfg, &registry).run().unwrap();

    assert_eq!(summary.seen, 1);
    assert_eq!(summary.claimed, 0);
    assert_eq!(summary.skipped, 1);
    assert!(summary.is_success());
    assert_eq!(status_of(&store.inner, 6), "InProgress");
    assert_eq!(files_in(dir.path()), 0);
}

#[test]
fn expired_leases_are_failed_on_next_run() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let stale = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let live = Utc::now() + Duration::days(1);
    let mut abandoned = task(8, 20, doc! {});
    abandoned.insert("task_status", "InProgress");
    abandoned.insert(fields::LEASE, bson::DateTime::from_chrono(stale));
    let mut running = task(9, 20, doc! {});
    running.insert("task_status", "InProgress");
    running.insert(fields::LEASE, bson::DateTime::from_chrono(live));
    let store = MemoryStore::new().with(TASKS, vec![abandoned, running]);
    let registry = ReportRegistry::standard();

    let summary = Dispatcher::new(&store, &cfg, &registry).run().unwrap();

    assert_eq!(summary.recovered, 1);
    assert_eq!(summary.seen, 0);
    assert!(!summary.is_success());

    let failed = task_by_id(&store, 8);
    assert_eq!(failed.get_str("task_status").unwrap(), "Failed");
    assert_eq!(failed.get_str("task_description").unwrap(), LEASE_EXPIRED_MESSAGE);
    assert_eq!(failed.get_i32("error_count").unwrap(), 1);
    assert_eq!(status_of(&store, 9), "InProgress");
}

/// Rejects the first `n` updates, then behaves normally.
struct FlakyUpdates {
    inner: MemoryStore,
    failures_left: Cell<u32>,
}

impl DocumentStore for FlakyUpdates {
    fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.inner.find(collection, query)
    }

    fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        self.inner.insert_one(collection, doc)
    }

    fn update_one(&self, collection: &str, query: &Query, update: &Update) -> Result<u64, StoreError> {
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(StoreError::backend(collection, "transient"));
        }
        self.inner.update_one(collection, query, update)
    }
}

#[test]
fn failed_lease_write_does_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let stale = bson::DateTime::from_chrono(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    let mut first = task(11, 20, doc! {});
    first.insert("task_status", "InProgress");
    first.insert(fields::LEASE, stale);
    let mut second = task(12, 20, doc! {});
    second.insert("task_status", "InProgress");
    second.insert(fields::LEASE, stale);
    let store = FlakyUpdates {
        inner: MemoryStore::new().with(TASKS, vec![first, second, task(13, 20, doc! {})]),
        failures_left: Cell::new(1),
    };
    let registry = ReportRegistry::standard();

    let summary = Dispatcher::new(&store, &cfg, &registry).run().unwrap();

    assert_eq!(summary.recovered, 1);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.error_count, 2);
    assert!(!summary.is_success());
    assert_eq!(status_of(&store.inner, 11), "InProgress");
    assert_eq!(status_of(&store.inner, 12), "Failed");
    assert_eq!(status_of(&store.inner, 13), "Complete");
}

#[test]
fn poll_failure_aborts_run() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let store = MemoryStore::new();
    store.fail_on(TASKS, Operation::Find);
    let registry = ReportRegistry::standard();

    let err = Dispatcher::new(&store, &cfg, &registry).run().unwrap_err();

    assert!(matches!(err, DispatchError::Store(_)));
}

#[test]
fn missing_allow_list_aborts_before_any_query() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path());
    cfg.templates.clear();
    let store = MemoryStore::new().with(TASKS, vec![task(1, 20, doc! {})]);
    let registry = ReportRegistry::standard();

    let err = Dispatcher::new(&store, &cfg, &registry).run().unwrap_err();

    assert!(matches!(err, DispatchError::MissingAllowList(_)));
    assert!(store.operations().is_empty());
}
