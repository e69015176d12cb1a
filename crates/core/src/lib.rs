//! Domain logic for the workflow registry.
//!
//! This crate has no database dependencies. Template validation, dependency
//! normalization and verdicts, and status transition guards all operate on
//! data loaded by the caller.

pub mod dependency;
pub mod error;
pub mod executor;
pub mod search;
pub mod status;
pub mod template;
pub mod transition;
pub mod types;
