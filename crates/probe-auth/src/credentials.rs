//! Credential and target types shared by all authentication strategies.

/// The database endpoint a probe dials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Server hostname or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Target database/catalog name.
    pub database: String,
}

impl Target {
    /// Create a new target.
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
        }
    }
}

/// Username/password credentials for a probe invocation.
///
/// Credentials are created once per invocation from the parsed configuration
/// and are read-only thereafter.
#[derive(Clone)]
pub struct Credentials {
    /// Credential principal, optionally in `user@REALM` form.
    pub username: String,
    /// Credential secret.
    pub password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether the username already embeds a realm (`user@REALM` form).
    ///
    /// Some drivers reject a connection string that names the realm twice,
    /// so strategies skip the explicit realm parameter in this case.
    #[must_use]
    pub fn embeds_realm(&self) -> bool {
        match self.username.split_once('@') {
            Some((user, realm)) => !user.is_empty() && !realm.is_empty(),
            None => false,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the secret in debug output
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
