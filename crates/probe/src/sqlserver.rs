//! Production SQL Server driver.
//!
//! Backed by tiberius. The driver builds its configuration from the
//! descriptor's structured fields; the TDS wire protocol and the
//! Kerberos/SPNEGO handshake byte format are negotiated inside the driver
//! stack and are not this crate's concern.

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use mssql_probe_auth::ConnectionDescriptor;

use crate::driver::{Connection, Driver, DriverError, RowOutcome};

/// The liveness-check query.
const PING_QUERY: &str = "SELECT 1";

/// Driver that opens tiberius connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDriver;

impl SqlServerDriver {
    /// Create the driver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn build_config(descriptor: &ConnectionDescriptor) -> Config {
    let target = descriptor.target();
    let credentials = descriptor.credentials();

    let mut config = Config::new();
    config.host(&target.host);
    config.port(target.port);
    if !target.database.is_empty() {
        config.database(&target.database);
    }
    config.authentication(AuthMethod::sql_server(
        &credentials.username,
        &credentials.password,
    ));
    config.trust_cert();
    config
}

#[async_trait]
impl Driver for SqlServerDriver {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, DriverError> {
        let config = build_config(descriptor);
        let addr = config.get_addr();
        let pool = descriptor.pool();

        tracing::debug!(
            addr = %addr,
            max_open = pool.max_open,
            max_idle = pool.idle.max_idle(),
            "dialing SQL Server"
        );
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;
        tcp.set_nodelay(true)
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        Ok(Box::new(SqlServerConnection {
            client: Some(client),
        }))
    }
}

struct SqlServerConnection {
    client: Option<Client<Compat<TcpStream>>>,
}

impl SqlServerConnection {
    fn client(&mut self) -> Result<&mut Client<Compat<TcpStream>>, DriverError> {
        self.client
            .as_mut()
            .ok_or_else(|| DriverError::Close("connection already closed".into()))
    }
}

#[async_trait]
impl Connection for SqlServerConnection {
    async fn ping(&mut self) -> Result<(), DriverError> {
        let client = self.client()?;
        let stream = client
            .simple_query(PING_QUERY)
            .await
            .map_err(|e| DriverError::Ping(e.to_string()))?;
        stream
            .into_row()
            .await
            .map_err(|e| DriverError::Ping(e.to_string()))?;
        Ok(())
    }

    async fn query_first_row(&mut self, sql: &str) -> Result<RowOutcome, DriverError> {
        let client = self.client()?;
        let stream = client
            .simple_query(sql)
            .await
            .map_err(|e| DriverError::Execute(e.to_string()))?;

        // into_row drops the stream (and any rows past the first) before
        // control returns, keeping cursor release ahead of handle release
        match stream.into_row().await {
            Ok(Some(_)) => Ok(RowOutcome::Row),
            Ok(None) => Ok(RowOutcome::Empty),
            Err(e) => Err(DriverError::RowRead(e.to_string())),
        }
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| DriverError::Close(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mssql_probe_auth::{AuthMode, Credentials, Target};

    use super::*;

    #[test]
    fn test_config_built_from_descriptor_fields() {
        let mode = AuthMode::PasswordKeytabPath {
            realm: "EXAMPLE.COM".into(),
            kdc_server: "kdc.example.com".into(),
            config_path: "/etc/krb5.conf".into(),
        };
        let descriptor = mode
            .build_descriptor(
                &Target::new("db.example.com", 1434, "scoring"),
                &Credentials::new("svc", "pw"),
                30,
            )
            .unwrap();

        let config = build_config(&descriptor);
        assert_eq!(config.get_addr(), "db.example.com:1434");
    }
}
