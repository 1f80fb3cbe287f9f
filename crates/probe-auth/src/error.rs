//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while building a connection descriptor or
/// negotiating credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field reached the descriptor builder empty.
    ///
    /// The configuration validator is the primary gate for this; hitting it
    /// here means the caller skipped validation.
    #[error("{0} is required; got \"\"")]
    MissingField(&'static str),

    /// The host/port combination could not be expressed as an endpoint.
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        /// The offending host:port rendering.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The remaining deadline budget was non-positive before any network
    /// attempt was made.
    #[error("deadline exhausted before connecting ({remaining_secs}s remaining)")]
    DeadlineExceeded {
        /// Whole seconds left on the budget at descriptor-construction time.
        remaining_secs: i64,
    },

    /// The explicit login round trip against the KDC failed.
    #[error("kerberos login failed: {0}")]
    KerberosLoginFailed(String),

    /// The requested authentication mode is not compiled into this build.
    #[error("unsupported authentication method: {0}")]
    Unsupported(String),
}
