//! Probe configuration model and validation.
//!
//! The configuration is a single declarative JSON document. Schema binding
//! is delegated to serde as a pure function over the raw text; everything
//! past parsing is ordered fail-fast validation with messages naming the
//! offending field and its received value.

use serde::Deserialize;

use mssql_probe_auth::{AuthMode, Credentials, Target};

use crate::error::ConfigError;

fn default_port() -> u16 {
    1433
}

/// Structured probe configuration, immutable once parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Hostname or address of the database server.
    #[serde(default, rename = "target")]
    pub server: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Credential principal.
    #[serde(default)]
    pub username: String,

    /// Credential secret.
    #[serde(default)]
    pub password: String,

    /// Target database/catalog name.
    #[serde(default)]
    pub database: String,

    /// Kerberos realm.
    #[serde(default, alias = "realm")]
    pub domain: String,

    /// Kerberos KDC address.
    #[serde(default, rename = "kdcserver")]
    pub kdc_server: String,

    /// Path to an existing Kerberos realm-configuration file.
    #[serde(default, rename = "krbpath", alias = "krb5_config_file")]
    pub krb_config_path: String,

    /// Construct the realm configuration in memory from `domain` and
    /// `kdcserver` and log in explicitly before connecting.
    #[serde(default)]
    pub inline_realm: bool,

    /// Validation query; empty skips the query phase.
    #[serde(default)]
    pub query: String,
}

impl ProbeConfig {
    /// Parse the raw configuration document.
    ///
    /// # Errors
    ///
    /// A schema-binding failure is surfaced verbatim as
    /// [`ConfigError::Malformed`].
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// The endpoint this configuration targets.
    #[must_use]
    pub fn target(&self) -> Target {
        Target::new(self.server.clone(), self.port, self.database.clone())
    }

    /// The credentials this configuration carries.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    /// Resolve the authentication mode from which fields are populated.
    ///
    /// Exactly one mode's field set may be populated; mixing the on-disk
    /// config path with the inline-realm flag is rejected.
    pub fn auth_mode(&self) -> Result<AuthMode, ConfigError> {
        if self.inline_realm && !self.krb_config_path.is_empty() {
            return Err(ConfigError::AmbiguousAuthMode);
        }
        if self.inline_realm {
            return Ok(AuthMode::ExplicitKerberosLogin {
                realm: self.domain.clone(),
                kdc_server: self.kdc_server.clone(),
            });
        }
        if self.krb_config_path.is_empty() {
            return Err(ConfigError::MissingField {
                field: "krbpath",
                got: self.krb_config_path.clone(),
            });
        }
        if self.kdc_server.is_empty() {
            Ok(AuthMode::PasswordRealmFile {
                realm: self.domain.clone(),
                config_path: self.krb_config_path.clone(),
            })
        } else {
            Ok(AuthMode::PasswordKeytabPath {
                realm: self.domain.clone(),
                kdc_server: self.kdc_server.clone(),
                config_path: self.krb_config_path.clone(),
            })
        }
    }

    /// Validate the configuration for the selected authentication mode.
    ///
    /// Pure pre-flight check; no network activity, no global state. Checks
    /// run in order and fail fast on the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = |field: &'static str, value: &str| {
            if value.is_empty() {
                Err(ConfigError::MissingField {
                    field,
                    got: value.to_string(),
                })
            } else {
                Ok(())
            }
        };

        required("server", &self.server)?;
        if self.port == 0 {
            return Err(ConfigError::InvalidPort { got: self.port });
        }
        required("username", &self.username)?;
        required("password", &self.password)?;
        required("database", &self.database)?;

        match self.auth_mode()? {
            AuthMode::PasswordRealmFile { .. } => {
                required("domain", &self.domain)?;
                required("krbpath", &self.krb_config_path)?;
            }
            AuthMode::PasswordKeytabPath { .. } => {
                required("domain", &self.domain)?;
                required("kdcserver", &self.kdc_server)?;
                required("krbpath", &self.krb_config_path)?;
            }
            AuthMode::ExplicitKerberosLogin { .. } => {
                required("domain", &self.domain)?;
                required("kdcserver", &self.kdc_server)?;
            }
        }

        Ok(())
    }
}
