//! Configuration types for Warden.
//!
//! This crate provides the pipeline configuration read from `warden.yaml`:
//! filter lists, default verdicts, the empty-changeset policy and the sink
//! list. Everything is validated when loaded so a malformed pipeline never
//! reaches the audit crates.

pub mod catalog;
pub mod loader;
pub mod types;
mod validate;

pub use catalog::TypeCatalog;
pub use loader::*;
pub use types::*;
