//! # Infrastructure Adapters
//!
//! Implementations of the [`AuditLogger`](crate::audit_logging::AuditLogger) interface.

pub mod filesystem_audit_log;
pub mod memory_audit_log;
pub mod rest_audit_log;
pub mod stdout_audit_log;

pub use filesystem_audit_log::FilesystemAuditLogger;
pub use memory_audit_log::InMemoryAuditLogger;
pub use rest_audit_log::{RestAuditLogger, RestAuditLoggerConfig};
pub use stdout_audit_log::StdoutAuditLogger;
