//! # mssql-probe
//!
//! Deadline-bound SQL Server connectivity check plugin.
//!
//! Given a declarative configuration, a probe establishes a single
//! authenticated connection to a SQL Server target, verifies liveness, and
//! optionally executes a validation query, all bounded by a caller-supplied
//! absolute deadline. It is one check inside a larger scoring/monitoring
//! platform that schedules many such probes against many targets.
//!
//! ## Entry Points
//!
//! | Function | Network | Description |
//! |----------|---------|-------------|
//! | [`validate`] | no | Pre-flight static check of a configuration document |
//! | [`run`] | yes | Execute the full probe under a deadline |
//! | [`init`] | no | One-time process-wide driver registration (idempotent) |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use mssql_probe::RunContext;
//!
//! let config = r#"{
//!     "target": "db.example.com",
//!     "username": "svc",
//!     "password": "secret",
//!     "database": "scoring",
//!     "domain": "EXAMPLE.COM",
//!     "krbpath": "/etc/krb5.conf",
//!     "query": "SELECT 1"
//! }"#;
//!
//! mssql_probe::validate(config)?;
//!
//! let ctx = RunContext::with_timeout(Duration::from_secs(30));
//! mssql_probe::run(&ctx, config).await?;
//! ```
//!
//! Each invocation owns its connection handle, Kerberos session, and
//! execution scope; nothing is shared or cached across invocations, and
//! nothing is retried internally.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod probe;
pub mod sqlserver;

// Re-export commonly used types
pub use config::ProbeConfig;
pub use context::{DeadlineBudget, RunContext};
pub use driver::{Connection, Driver, DriverError, RowOutcome, register_driver};
pub use error::{ConfigError, Phase, ProbeError};
pub use mssql_probe_auth::{
    AuthError, AuthMode, ConnectionDescriptor, Credentials, IdlePolicy, KdcTicketFactory,
    PoolPolicy, RealmConfig, Target, TicketClient, TicketClientFactory, TicketSession,
};
pub use probe::Probe;
pub use sqlserver::SqlServerDriver;

/// One-time process-wide initialization.
///
/// Registers the production SQL Server driver as the process default.
/// Idempotent: the first registration (including one a host performed via
/// [`register_driver`]) wins and later calls are no-ops. [`run`] invokes
/// this implicitly; hosts only need it when they want registration to
/// happen at a deterministic point before the first probe.
pub fn init() {
    drop(driver::default_driver());
}

/// Validate a probe configuration document.
///
/// Pure pre-flight check: parses the document and verifies the required
/// fields for the selected authentication mode. No network activity; the
/// hosting platform may call this independently of [`run`].
///
/// # Errors
///
/// [`ConfigError`] naming the offending field and its received value.
pub fn validate(config: &str) -> Result<(), ConfigError> {
    ProbeConfig::parse(config)?.validate()
}

/// Execute the full probe.
///
/// `ctx` must carry an absolute deadline; its absence is a configuration
/// error, not a default-timeout fallback.
///
/// # Errors
///
/// [`ProbeError`]; terminal for this invocation — retry policy belongs to
/// the hosting platform.
pub async fn run(ctx: &RunContext, config: &str) -> Result<(), ProbeError> {
    init();
    Probe::new().run(ctx, config).await
}
