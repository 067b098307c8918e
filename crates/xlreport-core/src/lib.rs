//! # xlreport-core
//!
//! Core domain model and traits for the xlreport batch exporter.
//!
//! This crate provides:
//! - Domain types: `Task`, `TaskStatus`, `TemplateId`, `Params`, `DateRange`
//! - The store-neutral `Query` and `Update` documents
//! - Core traits: `DocumentStore`
//! - Configuration loading (`Settings`, `RuntimeConfig`)
//! - Error types shared by every crate in the workspace
//!
//! ## Example
//!
//! ```rust
//! use xlreport_core::{Condition, Query, TaskStatus, TaskEvent};
//!
//! let query = Query::new()
//!     .with("Incident_Status", Condition::eq("Incident Open"));
//! assert_eq!(query.to_document().get_str("Incident_Status").unwrap(), "Incident Open");
//!
//! let next = TaskStatus::Open.apply(&TaskEvent::Claim).unwrap();
//! assert_eq!(next, TaskStatus::InProgress);
//! ```

use bson::Bson;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod config;
pub mod error;
pub mod params;
pub mod query;
pub mod store;
pub mod task;

pub use config::{EnvironmentSettings, RuntimeConfig, Settings, StoreSettings};
pub use error::{
    ConfigError, DispatchError, ExportError, RenderError, StoreError, TransitionError,
    ValidationError,
};
pub use params::{parse_date, DateRange, Params};
pub use query::{Clause, Condition, MatchMode, Query, Update};
pub use store::DocumentStore;
pub use task::{Task, TaskEvent, TaskId, TaskStatus};

// ============================================================================
// Identifiers
// ============================================================================

/// Identifies which report a task asks for.
///
/// Stored either as an integer or as a numeric string, depending on who
/// created the task record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

impl TemplateId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Read a template id from a stored value.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::Int32(n) => u32::try_from(*n).ok().map(Self),
            Bson::Int64(n) => u32::try_from(*n).ok().map(Self),
            Bson::Double(f) if f.fract() == 0.0 && *f >= 0.0 => Some(Self(*f as u32)),
            Bson::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Both stored spellings of this id, for `$in` queries.
    pub fn stored_forms(self) -> [Bson; 2] {
        [Bson::Int32(self.0 as i32), Bson::String(self.0.to_string())]
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for TemplateId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ============================================================================
// Tests
// ============================================================================
