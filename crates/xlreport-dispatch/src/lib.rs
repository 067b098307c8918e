//! # xlreport-dispatch
//!
//! Batch task dispatch for xlreport.
//!
//! This crate provides:
//! - `Dispatcher`: polls Open tasks, claims them, runs their reports and records the result
//! - `BatchSummary`: per-run counters; `is_success()` drives the process exit code
//!
//! A task moves `Open -> InProgress -> {Complete, Failed}`. Claiming stamps a
//! lease; the next run fails any task whose lease ran out.

pub mod dispatcher;
pub mod summary;

pub use dispatcher::{Dispatcher, EXPORT_FAILED, EXPORT_GENERATED, LEASE_EXPIRED_MESSAGE};
pub use summary::BatchSummary;
