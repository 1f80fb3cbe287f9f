//! Driver abstraction and process-wide driver registration.
//!
//! The probe lifecycle talks to the database through dyn-compatible traits
//! so the wire driver is swappable: production uses tiberius, tests use a
//! recording fake. Registration of the production driver is an explicit,
//! idempotent, one-time process-wide step rather than a module-load side
//! effect.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use thiserror::Error;

use mssql_probe_auth::ConnectionDescriptor;

/// Errors surfaced by a driver implementation.
///
/// The query path keeps execution failure and row-iteration failure
/// distinct; the lifecycle maps them to different probe errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Opening the connection failed.
    #[error("{0}")]
    Connect(String),

    /// The liveness check failed.
    #[error("{0}")]
    Ping(String),

    /// Query execution failed.
    #[error("{0}")]
    Execute(String),

    /// Row iteration failed after the query executed.
    #[error("{0}")]
    RowRead(String),

    /// Releasing the connection failed.
    #[error("{0}")]
    Close(String),
}

/// Outcome of fetching the first row of a validation query.
///
/// One row is enough; remaining rows are never consumed or inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// At least one row came back.
    Row,
    /// The query executed and returned no rows.
    Empty,
}

/// A database driver capable of opening one connection from a descriptor.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a connection. The descriptor's pool policy caps this at one
    /// concurrent connection per invocation.
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, DriverError>;
}

/// An open database connection.
#[async_trait]
pub trait Connection: Send {
    /// Liveness check.
    async fn ping(&mut self) -> Result<(), DriverError>;

    /// Execute a validation query and report whether it produced a row.
    async fn query_first_row(&mut self, sql: &str) -> Result<RowOutcome, DriverError>;

    /// Release the connection. Must be idempotent.
    async fn close(&mut self) -> Result<(), DriverError>;
}

#[async_trait]
impl Driver for Arc<dyn Driver> {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, DriverError> {
        self.as_ref().open(descriptor).await
    }
}

static DEFAULT_DRIVER: OnceCell<Arc<dyn Driver>> = OnceCell::new();

/// Register the process-wide default driver.
///
/// Idempotent: the first registration wins and later calls are no-ops.
/// Returns whether this call performed the registration. Hosts that want a
/// custom driver must register it before the first probe runs.
pub fn register_driver(driver: Arc<dyn Driver>) -> bool {
    DEFAULT_DRIVER.set(driver).is_ok()
}

/// The registered default driver, installing the production SQL Server
/// driver when nothing was registered yet.
pub(crate) fn default_driver() -> Arc<dyn Driver> {
    Arc::clone(DEFAULT_DRIVER.get_or_init(|| Arc::new(crate::sqlserver::SqlServerDriver::new())))
}
