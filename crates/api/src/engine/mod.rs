//! Workflow registry engine.
//!
//! Operations here run inside the caller's request transaction: every
//! function takes `&mut PgConnection` and never commits. Handlers open the
//! transaction, call in, and commit on success.

pub mod lifecycle;
pub mod permissions;
pub mod registry;
pub mod resolver;
