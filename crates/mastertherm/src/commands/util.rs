//! Shared helpers for command handlers.

use mastertherm_core::{Controller, DeviceIdentity};

use crate::error::CliError;

/// Resolve a module identifier (id or exact name) against the account's modules.
pub fn resolve_module(controller: &Controller, identifier: &str) -> Result<DeviceIdentity, CliError> {
    let devices = controller.devices();
    devices
        .iter()
        .find(|d| d.id == identifier)
        .or_else(|| devices.iter().find(|d| d.name.eq_ignore_ascii_case(identifier)))
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "module".into(),
            identifier: identifier.into(),
            list_command: "modules".into(),
        })
}

/// Reject NaN and infinities before they reach a setpoint.
pub fn validate_celsius(value: f64) -> Result<f64, CliError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CliError::Validation {
            field: "temperature".into(),
            reason: format!("{value} is not a temperature"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn celsius_must_be_finite() {
        assert!(validate_celsius(45.5).is_ok());
        assert!(validate_celsius(f64::NAN).is_err());
        assert!(validate_celsius(f64::INFINITY).is_err());
    }
}
