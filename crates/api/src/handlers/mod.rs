//! HTTP handlers.
//!
//! Each handler opens one transaction, runs the engine operation inside it,
//! and commits on success. Returning early with an error drops the
//! transaction, rolling back every write made by the request.

pub mod permission;
pub mod workflow;
pub mod workflow_template;
