//! Authentication strategy variants and connection-descriptor construction.
//!
//! A probe selects one of three credential-negotiation mechanisms from its
//! configuration. All three are expressed as variants of [`AuthMode`] so the
//! descriptor-building and validation logic lives in one place instead of
//! three near-identical modules.

use url::Url;

use crate::credentials::{Credentials, Target};
use crate::error::AuthError;

/// Idle-connection retention applied to the probe's connection handle.
///
/// Kept as a per-descriptor knob; every strategy currently disables idle
/// reuse since a probe never reuses a connection across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePolicy {
    /// No idle connections are retained (`max_idle = 0`).
    Disabled,
    /// Idle retention is unbounded (`max_idle = -1`).
    Unbounded,
}

impl IdlePolicy {
    /// The `max_idle` value this policy translates to.
    #[must_use]
    pub fn max_idle(&self) -> i32 {
        match self {
            Self::Disabled => 0,
            Self::Unbounded => -1,
        }
    }
}

/// Pool policy attached to a connection descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPolicy {
    /// Cap on concurrently open connections.
    pub max_open: u32,
    /// Idle-connection retention.
    pub idle: IdlePolicy,
}

impl PoolPolicy {
    /// The policy for a single-shot probe: one connection, no idle reuse.
    #[must_use]
    pub fn single_shot() -> Self {
        Self {
            max_open: 1,
            idle: IdlePolicy::Disabled,
        }
    }
}

/// A fully formed connection descriptor.
///
/// Carries the rendered connection string for drivers that consume one, the
/// structured endpoint and credentials for drivers that build their
/// configuration programmatically, and the pool policy. Created and consumed
/// within a single probe invocation; never persisted.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    dsn: String,
    target: Target,
    credentials: Credentials,
    pool: PoolPolicy,
}

impl ConnectionDescriptor {
    fn new(dsn: String, target: &Target, credentials: &Credentials) -> Self {
        Self {
            dsn,
            target: target.clone(),
            credentials: credentials.clone(),
            pool: PoolPolicy::single_shot(),
        }
    }

    /// The rendered connection string. Embeds the credential secret; treat
    /// it accordingly.
    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// The endpoint this descriptor dials.
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The credentials embedded in the descriptor.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The pool policy for the connection opened from this descriptor.
    #[must_use]
    pub fn pool(&self) -> PoolPolicy {
        self.pool
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The rendered string embeds the password; never print it
        f.debug_struct("ConnectionDescriptor")
            .field("dsn", &"[REDACTED]")
            .field("target", &self.target)
            .field("pool", &self.pool)
            .finish()
    }
}

/// The authentication mode of a probe invocation, selected from which
/// configuration fields are populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Password-derived Kerberos ticket via an on-disk realm-configuration
    /// file. Produces a URI-form descriptor.
    PasswordRealmFile {
        /// Kerberos realm.
        realm: String,
        /// Path to an existing realm-configuration file.
        config_path: String,
    },

    /// Password-derived Kerberos ticket with realm, KDC, and on-disk config
    /// path all named up front. Produces an ADO-form descriptor carrying the
    /// remaining deadline as a connection-timeout parameter.
    PasswordKeytabPath {
        /// Kerberos realm.
        realm: String,
        /// KDC address; validated as required, named by the on-disk config.
        kdc_server: String,
        /// Path to an existing realm-configuration file.
        config_path: String,
    },

    /// Explicit pre-authenticated Kerberos login: the realm configuration is
    /// synthesized in memory and a ticket client logs in against the KDC
    /// before the database connection is opened.
    ExplicitKerberosLogin {
        /// Kerberos realm.
        realm: String,
        /// KDC address for the synthesized realm configuration.
        kdc_server: String,
    },
}

impl AuthMode {
    /// Human-readable mode name for diagnostics.
    #[must_use]
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::PasswordRealmFile { .. } => "password + realm file",
            Self::PasswordKeytabPath { .. } => "password + config path",
            Self::ExplicitKerberosLogin { .. } => "explicit kerberos login",
        }
    }

    /// Whether this mode performs an out-of-band KDC login before the
    /// database connection is opened.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::ExplicitKerberosLogin { .. })
    }

    /// Build the connection descriptor for this mode.
    ///
    /// `timeout_secs` is the whole-second floor of the remaining deadline,
    /// computed once at the start of descriptor construction. A non-positive
    /// budget fails before any descriptor is built; no partial connection is
    /// ever opened.
    ///
    /// # Errors
    ///
    /// [`AuthError::DeadlineExceeded`] on a spent budget,
    /// [`AuthError::MissingField`] when a required field reached the builder
    /// empty, and [`AuthError::InvalidEndpoint`] when host and port cannot
    /// be expressed as an endpoint.
    pub fn build_descriptor(
        &self,
        target: &Target,
        credentials: &Credentials,
        timeout_secs: i64,
    ) -> Result<ConnectionDescriptor, AuthError> {
        if timeout_secs <= 0 {
            return Err(AuthError::DeadlineExceeded {
                remaining_secs: timeout_secs,
            });
        }
        if target.host.is_empty() {
            return Err(AuthError::MissingField("server"));
        }
        if credentials.username.is_empty() {
            return Err(AuthError::MissingField("username"));
        }
        if credentials.password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        tracing::debug!(
            mode = self.mode_name(),
            host = %target.host,
            port = target.port,
            "building connection descriptor"
        );

        let dsn = match self {
            Self::PasswordRealmFile { realm, config_path } => {
                if target.database.is_empty() {
                    return Err(AuthError::MissingField("database"));
                }
                if realm.is_empty() {
                    return Err(AuthError::MissingField("domain"));
                }
                if config_path.is_empty() {
                    return Err(AuthError::MissingField("krbpath"));
                }
                realm_file_uri(target, credentials, realm, config_path)?
            }
            Self::PasswordKeytabPath {
                realm,
                kdc_server,
                config_path,
            } => {
                if target.database.is_empty() {
                    return Err(AuthError::MissingField("database"));
                }
                if realm.is_empty() {
                    return Err(AuthError::MissingField("domain"));
                }
                if kdc_server.is_empty() {
                    return Err(AuthError::MissingField("kdcserver"));
                }
                if config_path.is_empty() {
                    return Err(AuthError::MissingField("krbpath"));
                }
                format!(
                    "authenticator=krb5;server={},{};database={};user id={};password={};krb5-realm={};krb5-configfile={};connection timeout={}",
                    target.host,
                    target.port,
                    target.database,
                    credentials.username,
                    credentials.password,
                    realm,
                    config_path,
                    timeout_secs,
                )
            }
            Self::ExplicitKerberosLogin { realm, kdc_server } => {
                if realm.is_empty() {
                    return Err(AuthError::MissingField("domain"));
                }
                if kdc_server.is_empty() {
                    return Err(AuthError::MissingField("kdcserver"));
                }
                // Database selection happens via the authenticated session;
                // the descriptor always targets master.
                format!(
                    "authenticator=krb5;server={},{};database=master;user id={};password={};krb5-realm={}",
                    target.host,
                    target.port,
                    credentials.username,
                    credentials.password,
                    realm,
                )
            }
        };

        Ok(ConnectionDescriptor::new(dsn, target, credentials))
    }
}

/// Render the URI-form descriptor for the realm-file mode.
///
/// `krb5-realm` is appended only when the username does not already embed a
/// realm (`user@REALM`); naming the realm twice is rejected by some drivers.
fn realm_file_uri(
    target: &Target,
    credentials: &Credentials,
    realm: &str,
    config_path: &str,
) -> Result<String, AuthError> {
    let endpoint = format!("{}:{}", target.host, target.port);
    let invalid = |reason: String| AuthError::InvalidEndpoint {
        endpoint: endpoint.clone(),
        reason,
    };

    let mut uri = Url::parse(&format!("sqlserver://{endpoint}"))
        .map_err(|e| invalid(e.to_string()))?;
    uri.set_username(&credentials.username)
        .map_err(|()| invalid("cannot carry credentials".into()))?;
    uri.set_password(Some(&credentials.password))
        .map_err(|()| invalid("cannot carry credentials".into()))?;

    {
        let mut pairs = uri.query_pairs_mut();
        pairs
            .append_pair("authenticator", "krb5")
            .append_pair("database", &target.database)
            .append_pair("krb5-configfile", config_path);
        if !credentials.embeds_realm() {
            pairs.append_pair("krb5-realm", realm);
        }
    }

    Ok(uri.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target::new("db.example.com", 1433, "scoring")
    }

    fn creds() -> Credentials {
        Credentials::new("svc", "pw")
    }

    #[test]
    fn test_realm_file_descriptor_is_uri_form() {
        let mode = AuthMode::PasswordRealmFile {
            realm: "EXAMPLE.COM".into(),
            config_path: "/etc/krb5.conf".into(),
        };
        let desc = mode.build_descriptor(&target(), &creds(), 30).unwrap();

        assert!(desc.dsn().starts_with("sqlserver://svc:pw@db.example.com:1433?"));
        assert!(desc.dsn().contains("authenticator=krb5"));
        assert!(desc.dsn().contains("database=scoring"));
        assert!(desc.dsn().contains("krb5-configfile=%2Fetc%2Fkrb5.conf"));
        assert!(desc.dsn().contains("krb5-realm=EXAMPLE.COM"));
    }

    #[test]
    fn test_realm_file_skips_realm_for_principal_with_realm() {
        let mode = AuthMode::PasswordRealmFile {
            realm: "EXAMPLE.COM".into(),
            config_path: "/etc/krb5.conf".into(),
        };
        let creds = Credentials::new("svc@EXAMPLE.COM", "pw");
        let desc = mode.build_descriptor(&target(), &creds, 30).unwrap();

        assert!(!desc.dsn().contains("krb5-realm"));
    }

    #[test]
    fn test_realm_file_percent_encodes_credentials() {
        let mode = AuthMode::PasswordRealmFile {
            realm: "EXAMPLE.COM".into(),
            config_path: "/etc/krb5.conf".into(),
        };
        let creds = Credentials::new("svc", "p@ss/word");
        let desc = mode.build_descriptor(&target(), &creds, 30).unwrap();

        assert!(!desc.dsn().contains("p@ss/word"));
        assert!(desc.dsn().contains("p%40ss%2Fword"));
    }

    #[test]
    fn test_keytab_path_descriptor_format() {
        let mode = AuthMode::PasswordKeytabPath {
            realm: "EXAMPLE.COM".into(),
            kdc_server: "kdc.example.com".into(),
            config_path: "/etc/krb5.conf".into(),
        };
        let desc = mode.build_descriptor(&target(), &creds(), 17).unwrap();

        assert_eq!(
            desc.dsn(),
            "authenticator=krb5;server=db.example.com,1433;database=scoring;\
             user id=svc;password=pw;krb5-realm=EXAMPLE.COM;\
             krb5-configfile=/etc/krb5.conf;connection timeout=17"
        );
    }

    #[test]
    fn test_explicit_login_targets_master() {
        let mode = AuthMode::ExplicitKerberosLogin {
            realm: "EXAMPLE.COM".into(),
            kdc_server: "kdc.example.com".into(),
        };
        let desc = mode.build_descriptor(&target(), &creds(), 30).unwrap();

        assert!(desc.dsn().contains("database=master"));
        assert!(desc.dsn().contains("krb5-realm=EXAMPLE.COM"));
        assert!(!desc.dsn().contains("scoring"));
    }

    #[test]
    fn test_spent_budget_fails_before_building() {
        let mode = AuthMode::PasswordKeytabPath {
            realm: "EXAMPLE.COM".into(),
            kdc_server: "kdc.example.com".into(),
            config_path: "/etc/krb5.conf".into(),
        };
        for secs in [0, -3] {
            let err = mode.build_descriptor(&target(), &creds(), secs).unwrap_err();
            assert!(matches!(err, AuthError::DeadlineExceeded { remaining_secs } if remaining_secs == secs));
        }
    }

    #[test]
    fn test_empty_fields_are_rejected_defensively() {
        let mode = AuthMode::PasswordRealmFile {
            realm: String::new(),
            config_path: "/etc/krb5.conf".into(),
        };
        let err = mode.build_descriptor(&target(), &creds(), 30).unwrap_err();
        assert!(matches!(err, AuthError::MissingField("domain")));

        let mode = AuthMode::ExplicitKerberosLogin {
            realm: "EXAMPLE.COM".into(),
            kdc_server: String::new(),
        };
        let err = mode.build_descriptor(&target(), &creds(), 30).unwrap_err();
        assert!(matches!(err, AuthError::MissingField("kdcserver")));

        let mode = AuthMode::PasswordKeytabPath {
            realm: "EXAMPLE.COM".into(),
            kdc_server: "kdc.example.com".into(),
            config_path: "/etc/krb5.conf".into(),
        };
        let err = mode
            .build_descriptor(&target(), &Credentials::new("", "pw"), 30)
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingField("username")));
    }

    #[test]
    fn test_pool_policy_is_single_shot() {
        let mode = AuthMode::ExplicitKerberosLogin {
            realm: "EXAMPLE.COM".into(),
            kdc_server: "kdc.example.com".into(),
        };
        let desc = mode.build_descriptor(&target(), &creds(), 30).unwrap();

        assert_eq!(desc.pool().max_open, 1);
        assert_eq!(desc.pool().idle, IdlePolicy::Disabled);
        assert_eq!(desc.pool().idle.max_idle(), 0);
        assert_eq!(IdlePolicy::Unbounded.max_idle(), -1);
    }

    #[test]
    fn test_descriptor_debug_redacts_dsn() {
        let mode = AuthMode::PasswordKeytabPath {
            realm: "EXAMPLE.COM".into(),
            kdc_server: "kdc.example.com".into(),
            config_path: "/etc/krb5.conf".into(),
        };
        let desc = mode.build_descriptor(&target(), &creds(), 30).unwrap();
        let debug = format!("{desc:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("password=pw"));
    }

    #[test]
    fn test_requires_login() {
        assert!(
            AuthMode::ExplicitKerberosLogin {
                realm: "R".into(),
                kdc_server: "k".into()
            }
            .requires_login()
        );
        assert!(
            !AuthMode::PasswordRealmFile {
                realm: "R".into(),
                config_path: "/c".into()
            }
            .requires_login()
        );
    }
}
