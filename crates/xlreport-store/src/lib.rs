//! # xlreport-store
//!
//! Document store backends for xlreport.
//!
//! This crate provides:
//! - `MongoStore`: the production backend over the synchronous MongoDB driver
//! - `MemoryStore`: an in-process backend for tests and dry runs
//!
//! Both implement `xlreport_core::DocumentStore`.

pub mod memory;
pub mod mongo;

pub use memory::{MemoryStore, Operation};
pub use mongo::MongoStore;
