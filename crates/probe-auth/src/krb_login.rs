//! Production ticket-client factory.
//!
//! Explicit Kerberos login performs an AS exchange against the KDC with
//! username/password credentials before the database connection is opened.
//! The implementation is pure Rust via the `sspi` crate and lives behind the
//! non-default `sspi-auth` feature; builds without it reject the
//! explicit-login mode at login time instead of carrying the dependency
//! unconditionally.

use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::realm::RealmConfig;
use crate::ticket::{TicketClient, TicketClientFactory};

/// Factory for ticket clients that log in against a real KDC.
#[derive(Debug, Clone, Copy, Default)]
pub struct KdcTicketFactory;

impl KdcTicketFactory {
    /// Create the factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TicketClientFactory for KdcTicketFactory {
    fn create(
        &self,
        realm: &RealmConfig,
        credentials: &Credentials,
        spn: &str,
    ) -> Result<Box<dyn TicketClient>, AuthError> {
        #[cfg(feature = "sspi-auth")]
        {
            return Ok(Box::new(sspi_login::SspiTicketClient::new(
                realm,
                credentials,
                spn,
            )));
        }
        #[cfg(not(feature = "sspi-auth"))]
        {
            let _ = (realm, credentials, spn);
            Err(AuthError::Unsupported(
                "explicit kerberos login requires the `sspi-auth` feature".into(),
            ))
        }
    }
}

#[cfg(feature = "sspi-auth")]
mod sspi_login {
    //! Kerberos login via sspi-rs.
    //!
    //! The KDC address comes from the synthesized realm configuration; DNS
    //! discovery is never used.

    use async_trait::async_trait;
    use sspi::{
        AuthIdentity, ClientRequestFlags, CredentialUse, Credentials as SspiCredentials,
        DataRepresentation, Kerberos, KerberosConfig, OwnedSecurityBuffer, SecurityBufferType,
        Sspi, Username,
    };

    use crate::credentials::Credentials;
    use crate::error::AuthError;
    use crate::realm::RealmConfig;
    use crate::ticket::TicketClient;

    fn login_err(e: impl std::fmt::Display) -> AuthError {
        AuthError::KerberosLoginFailed(e.to_string())
    }

    /// Ticket client backed by the sspi crate.
    pub(super) struct SspiTicketClient {
        kdc_url: String,
        principal: String,
        password: String,
        spn: String,
        active: bool,
    }

    impl SspiTicketClient {
        pub(super) fn new(realm: &RealmConfig, credentials: &Credentials, spn: &str) -> Self {
            // Principals without an embedded realm get the configured one
            let principal = if credentials.embeds_realm() {
                credentials.username.clone()
            } else {
                format!("{}@{}", credentials.username, realm.realm())
            };
            Self {
                kdc_url: format!("tcp://{}", realm.kdc()),
                principal,
                password: credentials.password.clone(),
                spn: spn.to_string(),
                active: false,
            }
        }
    }

    #[async_trait]
    impl TicketClient for SspiTicketClient {
        async fn login(&mut self) -> Result<(), AuthError> {
            let config = KerberosConfig::new(&self.kdc_url, "mssql-probe".to_string());
            let mut kerberos = Kerberos::new_client_from_config(config).map_err(login_err)?;

            let username = Username::parse(&self.principal).map_err(login_err)?;
            let identity = SspiCredentials::AuthIdentity(AuthIdentity {
                username,
                password: self.password.clone().into(),
            });

            let mut acquired = kerberos
                .acquire_credentials_handle()
                .with_credential_use(CredentialUse::Outbound)
                .with_auth_data(&identity)
                .execute(&mut kerberos)
                .map_err(login_err)?;

            // First context step drives the AS exchange against the KDC;
            // a token back means the KDC accepted the credentials.
            let mut output =
                vec![OwnedSecurityBuffer::new(Vec::new(), SecurityBufferType::Token)];
            let mut builder = kerberos
                .initialize_security_context()
                .with_credentials_handle(&mut acquired.credentials_handle)
                .with_context_requirements(ClientRequestFlags::MUTUAL_AUTH)
                .with_target_data_representation(DataRepresentation::Native)
                .with_target_name(&self.spn)
                .with_output(&mut output);
            kerberos
                .initialize_security_context_impl(&mut builder)
                .map_err(login_err)?
                .resolve_with_default_network_client()
                .map_err(login_err)?;

            self.active = true;
            tracing::debug!(principal = %self.principal, kdc = %self.kdc_url, "obtained kerberos ticket");
            Ok(())
        }

        fn destroy(&mut self) {
            if self.active {
                self.active = false;
                tracing::debug!(principal = %self.principal, "released kerberos ticket");
            }
        }
    }
}
