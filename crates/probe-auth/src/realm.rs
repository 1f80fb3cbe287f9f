//! In-memory Kerberos realm configuration.
//!
//! The explicit-login strategy never touches the filesystem: the realm
//! document a `krb5.conf` file would normally provide is synthesized from
//! the probe configuration and handed to the ticket client directly.

/// Default KDC port, appended when the configured address has none.
const DEFAULT_KDC_PORT: u16 = 88;

/// A minimal Kerberos realm configuration built from a realm name and a
/// KDC address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealmConfig {
    realm: String,
    kdc: String,
}

impl RealmConfig {
    /// Build a realm configuration.
    ///
    /// The KDC address gets the default Kerberos port appended when the
    /// configured value carries none.
    pub fn new(realm: impl Into<String>, kdc_server: impl Into<String>) -> Self {
        let kdc_server = kdc_server.into();
        let kdc = if kdc_server.contains(':') {
            kdc_server
        } else {
            format!("{kdc_server}:{DEFAULT_KDC_PORT}")
        };
        Self {
            realm: realm.into(),
            kdc,
        }
    }

    /// The realm name.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// The KDC address, always in `host:port` form.
    #[must_use]
    pub fn kdc(&self) -> &str {
        &self.kdc
    }

    /// Render the realm document.
    ///
    /// Defaults the realm, maps it to the configured KDC, and disables DNS
    /// lookups so the probe only ever talks to the KDC it was pointed at.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "[libdefaults]\n\
             default_realm = {realm}\n\
             dns_lookup_realm = false\n\
             dns_lookup_kdc = false\n\
             \n\
             [realms]\n\
             {realm} = {{\n\
             \tkdc = {kdc}\n\
             }}\n",
            realm = self.realm,
            kdc = self.kdc,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kdc_port_appended() {
        let config = RealmConfig::new("EXAMPLE.COM", "kdc.example.com");
        assert_eq!(config.kdc(), "kdc.example.com:88");
    }

    #[test]
    fn test_explicit_kdc_port_preserved() {
        let config = RealmConfig::new("EXAMPLE.COM", "kdc.example.com:750");
        assert_eq!(config.kdc(), "kdc.example.com:750");
    }

    #[test]
    fn test_render_document() {
        let doc = RealmConfig::new("EXAMPLE.COM", "kdc.example.com").render();
        assert!(doc.contains("default_realm = EXAMPLE.COM"));
        assert!(doc.contains("dns_lookup_kdc = false"));
        assert!(doc.contains("dns_lookup_realm = false"));
        assert!(doc.contains("kdc = kdc.example.com:88"));
        assert!(doc.contains("EXAMPLE.COM = {"));
    }
}
