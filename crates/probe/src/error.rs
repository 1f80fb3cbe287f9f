//! Probe error types.

use thiserror::Error;

use mssql_probe_auth::AuthError;

use crate::driver::DriverError;

/// Errors produced by configuration parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The raw configuration document could not be parsed.
    #[error("malformed probe configuration: {0}")]
    Malformed(String),

    /// A required field is missing or empty.
    #[error("{field} is required; got {got:?}")]
    MissingField {
        /// Configuration key name.
        field: &'static str,
        /// The received value.
        got: String,
    },

    /// The port is outside the valid range.
    #[error("port is invalid; got {got}")]
    InvalidPort {
        /// The received value.
        got: u16,
    },

    /// More than one authentication mode's field set is populated.
    #[error("krbpath and inline_realm are mutually exclusive; populate exactly one mode")]
    AmbiguousAuthMode,

    /// The invocation context carries no deadline.
    #[error("context deadline is not set")]
    NoDeadline,
}

/// The lifecycle phase a probe was in when its deadline elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Kerberos login round trip.
    Login,
    /// Connection open.
    Open,
    /// Liveness check.
    Ping,
    /// Validation query.
    Query,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::Open => "open",
            Self::Ping => "ping",
            Self::Query => "query",
        };
        f.write_str(name)
    }
}

/// Errors produced by a probe invocation.
///
/// All variants are terminal for the invocation; retry policy belongs to the
/// hosting platform.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Configuration parsing/validation failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Authentication strategy failure (descriptor construction or KDC
    /// login).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The database connection could not be opened.
    #[error("failed to open connection: {0}")]
    OpenFailed(#[source] DriverError),

    /// The liveness check failed.
    #[error("failed to ping server: {0}")]
    PingFailed(#[source] DriverError),

    /// The validation query failed to execute.
    #[error("failed to execute query: {0}")]
    QueryFailed(#[source] DriverError),

    /// The validation query executed but returned no rows: the target is
    /// reachable, the expected data is absent.
    #[error("no rows returned from query: {query:?}")]
    NoRows {
        /// The validation query text.
        query: String,
    },

    /// Row iteration failed after query execution.
    #[error("query failed while reading rows: {0}")]
    RowReadFailed(#[source] DriverError),

    /// The deadline elapsed during a lifecycle phase.
    #[error("deadline elapsed during {phase}")]
    Timeout {
        /// The phase that was cancelled.
        phase: Phase,
    },
}
