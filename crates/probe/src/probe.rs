//! The probe lifecycle.
//!
//! A probe invocation is a single logical unit of work: optional Kerberos
//! login, one connection open, a liveness check, an optional validation
//! query, then teardown. Every network-bound phase is scoped to the
//! invocation's absolute deadline, nothing is retried, and every acquired
//! resource is released exactly once no matter which phase failed.

use std::sync::Arc;

use tokio::time::{Instant, timeout_at};

use mssql_probe_auth::{
    AuthMode, ConnectionDescriptor, KdcTicketFactory, RealmConfig, TicketClientFactory,
    TicketSession,
};

use crate::config::ProbeConfig;
use crate::context::{DeadlineBudget, RunContext};
use crate::driver::{Connection, Driver, DriverError, RowOutcome};
use crate::error::{Phase, ProbeError};

/// A connectivity probe bound to a driver and a ticket-client factory.
///
/// [`Probe::new`] wires the production collaborators; tests and embedding
/// hosts supply their own through [`Probe::with_collaborators`].
pub struct Probe<D: Driver> {
    driver: D,
    tickets: Arc<dyn TicketClientFactory>,
}

impl Probe<Arc<dyn Driver>> {
    /// A probe over the registered process-wide driver and the KDC ticket
    /// factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            driver: crate::driver::default_driver(),
            tickets: Arc::new(KdcTicketFactory::new()),
        }
    }
}

impl Default for Probe<Arc<dyn Driver>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Driver> Probe<D> {
    /// A probe over explicit collaborators.
    pub fn with_collaborators(driver: D, tickets: Arc<dyn TicketClientFactory>) -> Self {
        Self { driver, tickets }
    }

    /// Execute the full probe against the given configuration.
    ///
    /// The context must carry an absolute deadline. Exactly one connection
    /// is opened; login (when the mode requires one) strictly precedes the
    /// open, the open precedes the ping, and the ping precedes the query.
    ///
    /// # Errors
    ///
    /// See [`ProbeError`]; every variant is terminal for this invocation.
    pub async fn run(&self, ctx: &RunContext, raw: &str) -> Result<(), ProbeError> {
        let config = ProbeConfig::parse(raw)?;
        config.validate()?;
        let budget = DeadlineBudget::derive(ctx)?;
        let mode = config.auth_mode()?;
        let target = config.target();
        let credentials = config.credentials();

        tracing::info!(
            host = %target.host,
            port = target.port,
            database = %target.database,
            mode = mode.mode_name(),
            remaining_secs = budget.remaining_secs,
            "running connectivity probe"
        );

        let deadline = Instant::from_std(budget.deadline);

        // The ticket session outlives the connection; the guard's drop at
        // the end of this scope destroys the ticket after teardown.
        let _session = match &mode {
            AuthMode::ExplicitKerberosLogin { realm, kdc_server } => {
                let realm_config = RealmConfig::new(realm.clone(), kdc_server.clone());
                let spn = format!("MSSQLSvc/{}:{}", target.host, target.port);
                let session = timeout_at(
                    deadline,
                    TicketSession::establish(
                        self.tickets.as_ref(),
                        &realm_config,
                        &credentials,
                        &spn,
                    ),
                )
                .await
                .map_err(|_| ProbeError::Timeout { phase: Phase::Login })??;
                Some(session)
            }
            _ => None,
        };

        let descriptor = mode.build_descriptor(&target, &credentials, budget.remaining_secs)?;
        self.dial_and_check(&descriptor, &config.query, deadline)
            .await
    }

    async fn dial_and_check(
        &self,
        descriptor: &ConnectionDescriptor,
        query: &str,
        deadline: Instant,
    ) -> Result<(), ProbeError> {
        let mut conn = match timeout_at(deadline, self.driver.open(descriptor)).await {
            Err(_) => return Err(ProbeError::Timeout { phase: Phase::Open }),
            Ok(Err(e)) => return Err(ProbeError::OpenFailed(e)),
            Ok(Ok(conn)) => conn,
        };

        let result = check(conn.as_mut(), query, deadline).await;

        // Teardown is unconditional; a close failure does not mask the
        // probe result.
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "failed to close probe connection");
        }

        result
    }
}

async fn check(
    conn: &mut dyn Connection,
    query: &str,
    deadline: Instant,
) -> Result<(), ProbeError> {
    match timeout_at(deadline, conn.ping()).await {
        Err(_) => return Err(ProbeError::Timeout { phase: Phase::Ping }),
        Ok(Err(e)) => return Err(ProbeError::PingFailed(e)),
        Ok(Ok(())) => {}
    }

    if query.is_empty() {
        tracing::debug!("ping succeeded, no validation query configured");
        return Ok(());
    }

    match timeout_at(deadline, conn.query_first_row(query)).await {
        Err(_) => Err(ProbeError::Timeout { phase: Phase::Query }),
        Ok(Err(e)) => {
            if matches!(e, DriverError::RowRead(_)) {
                Err(ProbeError::RowReadFailed(e))
            } else {
                Err(ProbeError::QueryFailed(e))
            }
        }
        Ok(Ok(RowOutcome::Row)) => {
            tracing::debug!("validation query returned a row");
            Ok(())
        }
        Ok(Ok(RowOutcome::Empty)) => Err(ProbeError::NoRows {
            query: query.to_string(),
        }),
    }
}
