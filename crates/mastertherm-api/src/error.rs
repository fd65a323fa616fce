use thiserror::Error;

/// Top-level error type for the `mastertherm-api` crate.
///
/// Covers every failure mode of the cloud service: login verdicts,
/// session expiry, vendor `errorId` envelopes, and the HTTP transport.
/// `mastertherm-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected by the service (non-zero `returncode`).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The session cookie is no longer accepted.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status that is not an authentication failure.
    #[error("Unexpected HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Vendor envelope ─────────────────────────────────────────────
    /// Error reported in the `{error: {errorId, errorMessage}}` envelope.
    #[error("MasterTherm error {error_id}: {message}")]
    Protocol { error_id: i64, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the server explicitly rejected the session
    /// and a fresh login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_is_auth_expired() {
        assert!(Error::SessionExpired.is_auth_expired());
        assert!(
            !Error::Authentication {
                message: "bad credentials".into()
            }
            .is_auth_expired()
        );
    }

    #[test]
    fn protocol_errors_are_not_auth_expired() {
        let err = Error::Protocol {
            error_id: 5,
            message: "busy".into(),
        };
        assert!(!err.is_auth_expired());
        assert_eq!(err.to_string(), "MasterTherm error 5: busy");
    }
}
