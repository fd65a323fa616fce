// ── API-to-domain type conversions ──
//
// Bridges raw `mastertherm_api` response types into canonical domain
// types, and domain configuration into transport settings.

use chrono::Utc;

use mastertherm_api::{DataResponse, ErrorInfo, ModuleInfo, TlsMode, TransportConfig};

use crate::config::{ControllerConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{DeviceIdentity, Snapshot};

impl From<ModuleInfo> for DeviceIdentity {
    fn from(m: ModuleInfo) -> Self {
        let name = m
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Heat Pump {}", m.id));
        DeviceIdentity { id: m.id, name }
    }
}

impl Snapshot {
    /// Build a snapshot from a successful data response.
    ///
    /// A success envelope without a `data` object is not a snapshot: it
    /// is rejected so the cached one stays in place.
    pub(crate) fn from_response(
        device_id: &str,
        message_id: u64,
        resp: DataResponse,
    ) -> Result<Self, CoreError> {
        if !resp.data.is_object() {
            return Err(CoreError::Protocol {
                error_id: resp.error.as_ref().map_or(0, ErrorInfo::id),
                message: "response carried no data".into(),
            });
        }
        Ok(Snapshot {
            device_id: device_id.to_owned(),
            vendor_timestamp: resp.timestamp,
            fetched_at: Utc::now(),
            message_id,
            data: resp.data,
        })
    }
}

pub(crate) fn transport_config(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn module_without_name_gets_fallback() {
        let module: ModuleInfo = serde_json::from_value(json!({ "id": 7 })).unwrap();
        let device = DeviceIdentity::from(module);
        assert_eq!(device.id, "7");
        assert_eq!(device.name, "Heat Pump 7");
    }

    #[test]
    fn module_name_is_kept() {
        let module: ModuleInfo =
            serde_json::from_value(json!({ "id": "42", "module_name": "Heat Pump A" })).unwrap();
        assert_eq!(
            DeviceIdentity::from(module),
            DeviceIdentity::new("42", "Heat Pump A")
        );
    }

    #[test]
    fn dataless_response_is_not_a_snapshot() {
        let resp: DataResponse = serde_json::from_value(json!({ "error": { "errorId": 0 } })).unwrap();
        let err = Snapshot::from_response("42", 3, resp).unwrap_err();
        assert!(matches!(err, CoreError::Protocol { error_id: 0, .. }));

        let resp: DataResponse =
            serde_json::from_value(json!({ "data": { "cfg": { "001": { "A_191": "21.5" } } } }))
                .unwrap();
        let snap = Snapshot::from_response("42", 4, resp).unwrap();
        assert_eq!(snap.message_id, 4);
        assert!(snap.data.is_object());
    }
}
