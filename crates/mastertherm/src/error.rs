//! CLI error types with miette diagnostics.
//!
//! Maps core, config, and accessory errors into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use mastertherm_config::ConfigError;
use mastertherm_core::{AccessoryError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach MasterTherm at {url}")]
    #[diagnostic(
        code(mastertherm::connection_failed),
        help(
            "Check your network connection and the service URL.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(mastertherm::timeout),
        help("Increase timeout with --timeout; the service can be slow to answer.")
    )]
    Timeout { url: String },

    #[error("Heat pump unavailable: {reason}")]
    #[diagnostic(
        code(mastertherm::unavailable),
        help("The module did not answer. Retry in a minute or run with -v for details.")
    )]
    ServiceUnavailable { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(mastertherm::auth_failed),
        help(
            "Verify your username and password.\n\
             Run: mastertherm config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(mastertherm::no_credentials),
        help(
            "Configure credentials with: mastertherm config init\n\
             Or set MASTERTHERM_USERNAME and MASTERTHERM_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(mastertherm::not_found),
        help("Run: mastertherm {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Vendor ───────────────────────────────────────────────────────

    #[error("MasterTherm error {code}: {message}")]
    #[diagnostic(code(mastertherm::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mastertherm::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(mastertherm::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: mastertherm config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(mastertherm::config),
        help("Check the file reported by: mastertherm config path")
    )]
    Config { message: String },

    #[error("Keyring error: {message}")]
    #[diagnostic(code(mastertherm::keyring))]
    Keyring { message: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(mastertherm::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(mastertherm::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ServiceUnavailable { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::ControllerDisconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "Controller connection was lost".into(),
            },

            CoreError::Timeout { url } => CliError::Timeout { url },

            CoreError::Protocol { error_id, message } => CliError::ApiError {
                code: error_id.to_string(),
                message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "http".into(), |s| s.to_string()),
                message,
            },

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "module".into(),
                identifier,
                list_command: "modules".into(),
            },

            CoreError::PointNotFound { device_id, point } => CliError::NotFound {
                resource_type: "point".into(),
                identifier: format!("{device_id}/{point}"),
                list_command: format!("points {device_id}"),
            },

            CoreError::MalformedValue {
                device_id,
                point,
                raw,
            } => CliError::ApiError {
                code: "malformed".into(),
                message: format!("{point} of module {device_id} reads as '{raw}'"),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(see: mastertherm config profiles)".into(),
            },
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

impl From<AccessoryError> for CliError {
    fn from(err: AccessoryError) -> Self {
        match err {
            AccessoryError::ServiceUnavailable { reason } => CliError::ServiceUnavailable { reason },
            AccessoryError::InvalidValue { message } => CliError::Validation {
                field: "value".into(),
                reason: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mastertherm_core::PointId;

    #[test]
    fn exit_codes_follow_error_class() {
        let auth = CliError::from(CoreError::AuthenticationFailed {
            message: "bad credentials".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let missing = CliError::from(CoreError::PointNotFound {
            device_id: "42".into(),
            point: PointId::analog(191),
        });
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);
        assert!(missing.to_string().contains("42/A_191"));

        let unavailable = CliError::from(AccessoryError::ServiceUnavailable {
            reason: "busy".into(),
        });
        assert_eq!(unavailable.exit_code(), exit_code::CONNECTION);
    }
}
