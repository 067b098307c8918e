//! The task dispatch loop
//!
//! One run:
//! 1. fail stale leases left behind by crashed runs,
//! 2. poll Open tasks whose template is allow-listed,
//! 3. for each, claim it, run its report, record the terminal status.
//!
//! Claims are conditional on the task still being Open, so concurrent
//! dispatchers never both run the same task.

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, info_span, warn};
use xlreport_core::task::fields;
use xlreport_core::{
    Condition, DispatchError, DocumentStore, Params, Query, RuntimeConfig, Task, TaskEvent, TaskStatus,
    TemplateId, Update,
};
use xlreport_reports::{ExportOutcome, Exporter, ReportRegistry};

use crate::summary::BatchSummary;

/// Description stamped on tasks whose lease ran out.
pub const LEASE_EXPIRED_MESSAGE: &str = "lease expired before completion; task abandoned";

/// `export_status` values
pub const EXPORT_GENERATED: &str = "Generated";
pub const EXPORT_FAILED: &str = "Failed";

/// How a claimed task ended.
#[derive(Debug)]
enum TaskOutcome {
    Completed(ExportOutcome),
    Failed(String),
}

/// Polls the task collection and runs reports for Open tasks.
pub struct Dispatcher<'a> {
    store: &'a dyn DocumentStore,
    config: &'a RuntimeConfig,
    registry: &'a ReportRegistry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(store: &'a dyn DocumentStore, config: &'a RuntimeConfig, registry: &'a ReportRegistry) -> Self {
        Self {
            store,
            config,
            registry,
        }
    }

    fn collection(&self) -> &str {
        &self.config.store.task_collection
    }

    /// Template id condition matching both stored spellings.
    fn allowed_templates(&self) -> Condition {
        Condition::one_of(self.config.template_ids().flat_map(TemplateId::stored_forms))
    }

    fn task_name(&self, id: TemplateId) -> String {
        self.config
            .template_name(id)
            .map_or_else(|| format!("Template {id}"), str::to_string)
    }

    /// Process every eligible Open task once.
    ///
    /// Only a missing allow-list or a failed poll aborts the run; everything
    /// else is recorded on the task and the batch continues.
    pub fn run(&self) -> Result<BatchSummary, DispatchError> {
        if self.config.templates.is_empty() {
            return Err(DispatchError::MissingAllowList(self.config.environment.clone()));
        }

        let mut summary = BatchSummary::default();
        let now = Utc::now();
        self.recover_expired_leases(now, &mut summary)?;

        let query = Query::new()
            .with(fields::TEMPLATE_ID, self.allowed_templates())
            .with(fields::STATUS, Condition::eq(TaskStatus::Open));
        debug!(collection = self.collection(), query = %query.to_document(), "Polling open tasks");
        let tasks = self.store.find(self.collection(), &query)?;
        summary.seen = tasks.len();

        if tasks.is_empty() {
            info!(environment = %self.config.environment, "No open tasks");
            return Ok(summary);
        }
        info!(tasks = tasks.len(), "Processing open tasks");

        for doc in &tasks {
            self.process(doc, &mut summary);
        }

        info!(%summary, "Batch finished");
        Ok(summary)
    }

    fn process(&self, doc: &Document, summary: &mut BatchSummary) {
        let task = match Task::from_document(self.collection(), doc) {
            Ok(task) => task,
            Err(e) => {
                error!(error = %e, "Skipping unreadable task");
                summary.skipped += 1;
                summary.error_count += 1;
                return;
            }
        };
        let _span = info_span!("task", task_id = %task.task_id, template_id = %task.template_id).entered();

        let status = match self.claim(&task) {
            Ok(Some(status)) => status,
            Ok(None) => {
                warn!("Task already claimed; skipping");
                summary.skipped += 1;
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to claim task");
                summary.skipped += 1;
                summary.error_count += 1;
                return;
            }
        };
        summary.claimed += 1;

        let name = self.task_name(task.template_id);
        let outcome = self.execute(&task, &name);
        let recorded = match &outcome {
            TaskOutcome::Completed(export) => self.complete(&task, status, &name, export),
            TaskOutcome::Failed(message) => self.fail(&task, status, message),
        };
        if let Err(e) = recorded {
            error!(error = %e, "Failed to record task status");
            summary.error_count += 1;
        }

        match outcome {
            TaskOutcome::Completed(export) => {
                info!(path = %export.path.display(), records = export.record_count, "Task complete");
                summary.completed += 1;
            }
            TaskOutcome::Failed(message) => {
                error!(error = %message, "Task failed");
                summary.failed += 1;
                summary.error_count += 1;
            }
        }
    }

    fn execute(&self, task: &Task, name: &str) -> TaskOutcome {
        let Some(report) = self.registry.get(task.template_id) else {
            return TaskOutcome::Failed(format!(
                "{name} failed: no report registered for template {}",
                task.template_id
            ));
        };
        let exporter = Exporter::new(self.store, &self.config.export_dir);
        match exporter.export(report, &Params::new(task.parameters.clone())) {
            Ok(export) => TaskOutcome::Completed(export),
            Err(e) => TaskOutcome::Failed(format!("{name} failed: {e}")),
        }
    }

    /// Move Open -> InProgress. `None` when another dispatcher got there first.
    fn claim(&self, task: &Task) -> Result<Option<TaskStatus>, DispatchError> {
        let next = task.status.apply(&TaskEvent::Claim)?;
        let now = Utc::now();
        let lease = now + self.config.lease();
        let update = Update::new()
            .set(fields::STATUS, next)
            .set(fields::LEASE, bson::DateTime::from_chrono(lease))
            .set(fields::LAST_UPDATED, bson::DateTime::from_chrono(now));
        let matched = self
            .store
            .update_one(self.collection(), &self.task_filter(task, task.status), &update)?;
        Ok((matched > 0).then_some(next))
    }

    fn complete(
        &self,
        task: &Task,
        status: TaskStatus,
        name: &str,
        export: &ExportOutcome,
    ) -> Result<(), DispatchError> {
        let next = status.apply(&TaskEvent::Complete)?;
        let update = Update::new()
            .set(fields::STATUS, next)
            .set(fields::DESCRIPTION, format!("{name} completed with 0 errors"))
            .set(fields::EXPORT_PATH, export.path.to_string_lossy().into_owned())
            .set(fields::EXPORT_FILENAME, export.file_name.as_str())
            .set(fields::EXPORT_STATUS, EXPORT_GENERATED)
            .set(fields::LAST_UPDATED, bson::DateTime::now());
        self.record(task, status, &update)
    }

    fn fail(&self, task: &Task, status: TaskStatus, message: &str) -> Result<(), DispatchError> {
        let event = TaskEvent::Fail(message.to_string());
        let next = status.apply(&event)?;
        let update = Update::new()
            .set(fields::STATUS, next)
            .set(fields::DESCRIPTION, event.error_message().unwrap_or_default())
            .set(fields::EXPORT_STATUS, EXPORT_FAILED)
            .set(fields::LAST_UPDATED, bson::DateTime::now())
            .inc(fields::ERROR_COUNT, 1);
        self.record(task, status, &update)
    }

    fn record(&self, task: &Task, from: TaskStatus, update: &Update) -> Result<(), DispatchError> {
        let matched = self
            .store
            .update_one(self.collection(), &self.task_filter(task, from), update)?;
        if matched == 0 {
            warn!("Task left {from} before its result was recorded");
        }
        Ok(())
    }

    fn task_filter(&self, task: &Task, status: TaskStatus) -> Query {
        Query::new()
            .with(fields::TASK_ID, Condition::eq(task.task_id.as_bson().clone()))
            .with(fields::STATUS, Condition::eq(status))
    }

    /// Fail every allow-listed InProgress task whose lease ended before `now`.
    ///
    /// Only a failed lookup aborts; a status write that fails is logged and
    /// counted, and recovery moves on to the next task.
    pub fn recover_expired_leases(
        &self,
        now: DateTime<Utc>,
        summary: &mut BatchSummary,
    ) -> Result<(), DispatchError> {
        let query = Query::new()
            .with(fields::TEMPLATE_ID, self.allowed_templates())
            .with(fields::STATUS, Condition::eq(TaskStatus::InProgress));
        for doc in self.store.find(self.collection(), &query)? {
            let task = match Task::from_document(self.collection(), &doc) {
                Ok(task) => task,
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable in-progress task");
                    continue;
                }
            };
            if !task.lease_expired(now) {
                continue;
            }
            let expired = match &task.lease_expires_at {
                Some(at) => Bson::DateTime(bson::DateTime::from_chrono(*at)),
                None => Bson::Null,
            };
            warn!(task_id = %task.task_id, lease_expires_at = %expired, "Lease expired");
            summary.error_count += 1;
            match self.fail(&task, task.status, LEASE_EXPIRED_MESSAGE) {
                Ok(()) => summary.recovered += 1,
                Err(e) => error!(task_id = %task.task_id, error = %e, "Failed to record expired lease"),
            }
        }
        if summary.recovered > 0 {
            info!(recovered = summary.recovered, "Recovered expired leases");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::collections::BTreeMap;
    use xlreport_core::StoreSettings;

    fn config(templates: &[(u32, &str)]) -> RuntimeConfig {
        RuntimeConfig {
            environment: "test".to_string(),
            export_dir: std::env::temp_dir(),
            lease_seconds: 60,
            templates: templates
                .iter()
                .map(|(id, name)| (TemplateId(*id), (*name).to_string()))
                .collect::<BTreeMap<_, _>>(),
            store: StoreSettings {
                uri: "mongodb://localhost:27017".to_string(),
                database: "drs".to_string(),
                task_collection: "System_tasks".to_string(),
            },
        }
    }

    struct NoStore;

    impl DocumentStore for NoStore {
        fn find(&self, _: &str, _: &Query) -> Result<Vec<Document>, xlreport_core::StoreError> {
            Ok(Vec::new())
        }
        fn insert_one(&self, _: &str, _: Document) -> Result<(), xlreport_core::StoreError> {
            Ok(())
        }
        fn update_one(&self, _: &str, _: &Query, _: &Update) -> Result<u64, xlreport_core::StoreError> {
            Ok(0)
        }
    }

    #[test]
    fn allow_list_matches_both_spellings() {
        let cfg = config(&[(20, "Incident"), (21, "Open incidents")]);
        let registry = ReportRegistry::new();
        let dispatcher = Dispatcher::new(&NoStore, &cfg, &registry);
        let query = Query::new().with(fields::TEMPLATE_ID, dispatcher.allowed_templates());
        assert!(query.matches(&doc! { "Template_Task_Id": 20 }));
        assert!(query.matches(&doc! { "Template_Task_Id": "21" }));
        assert!(!query.matches(&doc! { "Template_Task_Id": 22 }));
    }

    #[test]
    fn task_name_falls_back_to_id() {
        let cfg = config(&[(20, "Incident Detail Export")]);
        let registry = ReportRegistry::new();
        let dispatcher = Dispatcher::new(&NoStore, &cfg, &registry);
        assert_eq!(dispatcher.task_name(TemplateId(20)), "Incident Detail Export");
        assert_eq!(dispatcher.task_name(TemplateId(7)), "Template 7");
    }

    #[test]
    fn empty_allow_list_fails_fast() {
        let cfg = config(&[]);
        let registry = ReportRegistry::standard();
        let err = Dispatcher::new(&NoStore, &cfg, &registry).run().unwrap_err();
        assert!(matches!(err, DispatchError::MissingAllowList(env) if env == "test"));
    }
}
