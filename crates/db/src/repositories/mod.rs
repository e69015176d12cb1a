//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&mut PgConnection` as the first argument. Callers pass `&mut *tx` to run
//! several calls inside one request transaction, or a pooled connection.

pub mod permission_repo;
pub mod workflow_repo;
pub mod workflow_template_repo;

pub use permission_repo::PermissionRepo;
pub use workflow_repo::WorkflowRepo;
pub use workflow_template_repo::WorkflowTemplateRepo;
