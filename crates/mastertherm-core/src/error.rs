// ── Core error types ──
//
// User-facing errors from mastertherm-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<mastertherm_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::codec::CodecError;
use crate::model::PointId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach MasterTherm at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    // ── Vendor errors ────────────────────────────────────────────────
    #[error("MasterTherm reported error {error_id}: {message}")]
    Protocol { error_id: i64, message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Point {point} not found in snapshot of device {device_id}")]
    PointNotFound { device_id: String, point: PointId },

    #[error("Point {point} of device {device_id} has malformed value: {raw}")]
    MalformedValue {
        device_id: String,
        point: PointId,
        raw: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Attach a device id to a codec failure.
    pub fn from_codec(device_id: &str, err: CodecError) -> Self {
        match err {
            CodecError::PointNotFound { point } => Self::PointNotFound {
                device_id: device_id.to_owned(),
                point,
            },
            CodecError::MalformedValue { point, raw } => Self::MalformedValue {
                device_id: device_id.to_owned(),
                point,
                raw,
            },
            CodecError::KindMismatch { .. } => Self::ValidationFailed {
                message: err.to_string(),
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<mastertherm_api::Error> for CoreError {
    fn from(err: mastertherm_api::Error) -> Self {
        match err {
            mastertherm_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            mastertherm_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- re-authentication required".into(),
            },
            mastertherm_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() || e.is_request() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            mastertherm_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            mastertherm_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            mastertherm_api::Error::Http { status, body } => CoreError::Api {
                message: format!("HTTP {status}: {body}"),
                status: Some(status),
            },
            mastertherm_api::Error::Protocol { error_id, message } => {
                CoreError::Protocol { error_id, message }
            }
            mastertherm_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_errors_map_to_domain() {
        let err = CoreError::from(mastertherm_api::Error::Protocol {
            error_id: 5,
            message: "busy".into(),
        });
        assert!(matches!(err, CoreError::Protocol { error_id: 5, .. }));

        let err = CoreError::from(mastertherm_api::Error::Authentication {
            message: "bad credentials".into(),
        });
        assert_eq!(err.to_string(), "Authentication failed: bad credentials");
    }

    #[test]
    fn codec_errors_carry_device() {
        let err = CoreError::from_codec(
            "42",
            CodecError::PointNotFound {
                point: PointId::analog(191),
            },
        );
        assert_eq!(
            err.to_string(),
            "Point A_191 not found in snapshot of device 42"
        );
    }
}
