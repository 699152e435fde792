//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

/// Why a single reminder effect could not be delivered.
///
/// Reminder effects are best-effort; these are logged and dropped.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("permission not granted")]
    PermissionDenied,
    #[error("not supported on this device")]
    Unsupported,
    #[error("delivery failed: {0}")]
    Failed(String),
}
