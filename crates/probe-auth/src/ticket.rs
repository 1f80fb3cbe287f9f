//! Ticket-granting client abstraction.
//!
//! The explicit-login strategy owns a live ticket-granting-ticket client for
//! the duration of one probe invocation. The client is created immediately
//! before the database connection is opened and destroyed unconditionally
//! when the invocation ends, regardless of how the connection step fared.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::realm::RealmConfig;

/// A ticket-granting client for one probe invocation.
///
/// `#[async_trait]` keeps the trait object-safe so probes can run against a
/// recording fake in tests.
#[async_trait]
pub trait TicketClient: Send {
    /// Perform the login round trip against the KDC.
    async fn login(&mut self) -> Result<(), AuthError>;

    /// Release the ticket. Must be idempotent.
    fn destroy(&mut self);
}

/// Builds ticket clients from a synthesized realm configuration.
pub trait TicketClientFactory: Send + Sync {
    /// Create a ticket client for the given realm, credentials, and target
    /// service principal (`MSSQLSvc/host:port`).
    fn create(
        &self,
        realm: &RealmConfig,
        credentials: &Credentials,
        spn: &str,
    ) -> Result<Box<dyn TicketClient>, AuthError>;
}

/// A logged-in Kerberos session, exclusively owned by one probe invocation.
///
/// The session destroys its ticket exactly once on every exit path: either
/// here in `establish` when the login itself fails, or on drop.
pub struct TicketSession {
    client: Option<Box<dyn TicketClient>>,
}

impl TicketSession {
    /// Create a ticket client and log in against the KDC.
    ///
    /// # Errors
    ///
    /// Surfaces factory failures verbatim and login failures as
    /// [`AuthError::KerberosLoginFailed`]; a client whose login failed is
    /// destroyed before this returns.
    pub async fn establish(
        factory: &dyn TicketClientFactory,
        realm: &RealmConfig,
        credentials: &Credentials,
        spn: &str,
    ) -> Result<Self, AuthError> {
        let mut client = factory.create(realm, credentials, spn)?;
        match client.login().await {
            Ok(()) => {
                tracing::debug!(realm = realm.realm(), spn, "kerberos login succeeded");
                Ok(Self {
                    client: Some(client),
                })
            }
            Err(e) => {
                tracing::debug!(realm = realm.realm(), spn, error = %e, "kerberos login failed");
                client.destroy();
                Err(e)
            }
        }
    }
}

impl Drop for TicketSession {
    fn drop(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.destroy();
        }
    }
}

impl std::fmt::Debug for TicketSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketSession")
            .field("active", &self.client.is_some())
            .finish()
    }
}
