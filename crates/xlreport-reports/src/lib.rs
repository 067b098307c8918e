//! # xlreport-reports
//!
//! Report builders and the export pipeline.
//!
//! This crate provides:
//! - `ReportDefinition`: declarative parameters, base conditions, columns and audit target
//! - `ReportBuilder`: the validate / query / shape / summarize contract every report implements
//! - `ReportRegistry`: template id lookup, preloaded with the standard catalog
//! - `Exporter`: runs one builder against an injected store and writes the `.xlsx` file
//!
//! ## Example
//!
//! ```rust
//! use xlreport_core::{Params, TemplateId};
//! use xlreport_reports::ReportRegistry;
//!
//! let registry = ReportRegistry::standard();
//! let report = registry.get(TemplateId(20)).unwrap();
//! let filters = report
//!     .validate(&Params::from_pairs([("status", "Incident Open")]))
//!     .unwrap();
//! assert_eq!(
//!     report.query(&filters).to_document().get_str("Incident_Status").unwrap(),
//!     "Incident Open"
//! );
//! ```

pub mod builder;
pub mod catalog;
pub mod definition;
pub mod export;
pub mod registry;

pub use builder::{ApprovalReport, DefinedReport, ReportBuilder};
pub use definition::{FilterValue, Filters, ParamKind, ParamSpec, ReportDefinition, Target};
pub use export::{ExportOutcome, Exporter, FILE_TIMESTAMP_FORMAT};
pub use registry::ReportRegistry;
