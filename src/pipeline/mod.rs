//! Pipeline entry points.
//!
//! - `run_collection`: probe, log in, traverse and report
//! - `write_report`: persist the result as JSON

pub mod collect;

pub use collect::{CollectionRequest, RunReport, run_collection, write_report};
