//! Task records and their status automaton
//!
//! A task moves through exactly one path:
//!
//! ```text
//! Open --Claim--> InProgress --Complete--> Complete
//!                            \--Fail-----> Failed
//! ```
//!
//! Only the dispatcher moves tasks. Records are never deleted.

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{StoreError, TransitionError};
use crate::TemplateId;

/// Stored field names on task records.
pub mod fields {
    pub const TASK_ID: &str = "Task_Id";
    pub const TEMPLATE_ID: &str = "Template_Task_Id";
    pub const STATUS: &str = "task_status";
    pub const PARAMETERS: &str = "parameters";
    pub const DESCRIPTION: &str = "task_description";
    pub const ERROR_COUNT: &str = "error_count";
    pub const LEASE: &str = "lease_expires_at";
    pub const EXPORT_PATH: &str = "export_path";
    pub const EXPORT_FILENAME: &str = "export_filename";
    pub const EXPORT_STATUS: &str = "export_status";
    pub const LAST_UPDATED: &str = "last_updated";
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Open,
    InProgress,
    Complete,
    Failed,
}

impl TaskStatus {
    /// Stored spelling
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Complete => "Complete",
            TaskStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Failed)
    }

    /// Apply an event, returning the next state.
    pub fn apply(self, event: &TaskEvent) -> Result<TaskStatus, TransitionError> {
        match (self, event) {
            (TaskStatus::Open, TaskEvent::Claim) => Ok(TaskStatus::InProgress),
            (TaskStatus::InProgress, TaskEvent::Complete) => Ok(TaskStatus::Complete),
            (TaskStatus::InProgress, TaskEvent::Fail(_)) => Ok(TaskStatus::Failed),
            (from, event) => Err(TransitionError {
                from,
                event: event.name(),
            }),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(TaskStatus::Open),
            "InProgress" => Ok(TaskStatus::InProgress),
            "Complete" => Ok(TaskStatus::Complete),
            "Failed" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status '{other}'")),
        }
    }
}

impl From<TaskStatus> for Bson {
    fn from(status: TaskStatus) -> Self {
        Bson::String(status.as_str().to_string())
    }
}

/// Something that happens to a task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskEvent {
    Claim,
    Complete,
    Fail(String),
}

impl TaskEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TaskEvent::Claim => "claim",
            TaskEvent::Complete => "complete",
            TaskEvent::Fail(_) => "fail",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TaskEvent::Fail(msg) => Some(msg),
            _ => None,
        }
    }
}

// ============================================================================
// Task
// ============================================================================

/// Task identifier, kept in whatever form the record stores it.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskId(Bson);

impl TaskId {
    pub fn new(value: impl Into<Bson>) -> Self {
        Self(value.into())
    }

    pub fn as_bson(&self) -> &Bson {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Bson::String(s) => write!(f, "{s}"),
            Bson::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            other => write!(f, "{other}"),
        }
    }
}

/// A unit of report work read from the task collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub task_id: TaskId,
    pub template_id: TemplateId,
    pub status: TaskStatus,
    pub parameters: Document,
    pub error_count: u32,
    pub description: Option<String>,
    pub lease_expires_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(task_id: impl Into<Bson>, template_id: TemplateId) -> Self {
        Self {
            task_id: TaskId::new(task_id),
            template_id,
            status: TaskStatus::Open,
            parameters: Document::new(),
            error_count: 0,
            description: None,
            lease_expires_at: None,
        }
    }

    pub fn parameters(mut self, parameters: Document) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Decode a stored task record.
    pub fn from_document(collection: &str, doc: &Document) -> Result<Self, StoreError> {
        let task_id = doc
            .get(fields::TASK_ID)
            .cloned()
            .ok_or_else(|| StoreError::decode(collection, "task without Task_Id"))?;
        let template_id = doc
            .get(fields::TEMPLATE_ID)
            .and_then(TemplateId::from_bson)
            .ok_or_else(|| {
                StoreError::decode(collection, format!("task {task_id} has no usable Template_Task_Id"))
            })?;
        let status = doc
            .get_str(fields::STATUS)
            .map_err(|e| StoreError::decode(collection, format!("task {task_id}: {e}")))?
            .parse::<TaskStatus>()
            .map_err(|e| StoreError::decode(collection, format!("task {task_id}: {e}")))?;
        let parameters = match doc.get(fields::PARAMETERS) {
            Some(Bson::Document(params)) => params.clone(),
            Some(Bson::Null) | None => Document::new(),
            Some(other) => {
                return Err(StoreError::decode(
                    collection,
                    format!("task {task_id}: parameters must be a document, got {other}"),
                ))
            }
        };
        let error_count = match doc.get(fields::ERROR_COUNT) {
            Some(Bson::Int32(n)) => u32::try_from(*n).unwrap_or(0),
            Some(Bson::Int64(n)) => u32::try_from(*n).unwrap_or(0),
            _ => 0,
        };
        let description = doc.get_str(fields::DESCRIPTION).ok().map(str::to_string);
        let lease_expires_at = match doc.get(fields::LEASE) {
            Some(Bson::DateTime(dt)) => Some(dt.to_chrono()),
            _ => None,
        };

        Ok(Self {
            task_id: TaskId(task_id),
            template_id,
            status,
            parameters,
            error_count,
            description,
            lease_expires_at,
        })
    }

    /// Encode as a stored task record.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(fields::TASK_ID, self.task_id.0.clone());
        doc.insert(fields::TEMPLATE_ID, Bson::Int32(self.template_id.get() as i32));
        doc.insert(fields::STATUS, self.status);
        doc.insert(fields::PARAMETERS, self.parameters.clone());
        doc.insert(fields::ERROR_COUNT, Bson::Int32(self.error_count as i32));
        if let Some(desc) = &self.description {
            doc.insert(fields::DESCRIPTION, desc.clone());
        }
        if let Some(lease) = self.lease_expires_at {
            doc.insert(fields::LEASE, bson::DateTime::from_chrono(lease));
        }
        doc
    }

    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::InProgress
            && self.lease_expires_at.map_or(true, |deadline| deadline <= now)
    }
}

// ============================================================================
// Tests
// ============================================================================
