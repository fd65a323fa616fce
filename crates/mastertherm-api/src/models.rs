// MasterTherm wire types
//
// The service is loose about scalar types: `returncode`, `errorId`, module
// ids and timestamps arrive as numbers on some firmware and as strings on
// others. The lenient deserializers below normalize both shapes.

use serde::{Deserialize, Deserializer, Serialize};

// ── Login ────────────────────────────────────────────────────────────

/// Body of the `client_login.php` response.
///
/// ```json
/// { "returncode": 0, "message": "...", "modules": [{ "id": "42", "module_name": "..." }] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub returncode: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleInfo>,
}

/// One heat-pump module attached to the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, rename = "module_name")]
    pub name: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Data / write envelope ────────────────────────────────────────────

/// Response of both visualization servlets.
///
/// ```json
/// { "timestamp": "...", "data": { "varfile_mt1_config1": { "001": { "A_3": "4.5" } } },
///   "error": { "errorId": 0, "errorMessage": "" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Vendor error block. `errorId == 0` means success.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorInfo {
    #[serde(default, rename = "errorId", deserialize_with = "lenient_i64")]
    pub error_id: Option<i64>,
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
}

impl ErrorInfo {
    pub fn id(&self) -> i64 {
        self.error_id.unwrap_or(0)
    }
}

// ── Lenient scalars ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s,
        }
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Int(i)) => Ok(Some(i)),
        Some(Scalar::Float(f)) => Err(serde::de::Error::custom(format!(
            "expected integer, got {f}"
        ))),
        Some(Scalar::Str(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse().map(Some).map_err(serde::de::Error::custom)
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_accepts_string_returncode_and_numeric_ids() {
        let resp: LoginResponse = serde_json::from_value(json!({
            "returncode": "0",
            "message": "ok",
            "modules": [{ "id": 42, "module_name": "Heat Pump A", "type": "1" }]
        }))
        .unwrap();

        assert_eq!(resp.returncode, Some(0));
        assert_eq!(resp.modules[0].id, "42");
        assert_eq!(resp.modules[0].name.as_deref(), Some("Heat Pump A"));
        assert!(resp.modules[0].extra.contains_key("type"));
    }

    #[test]
    fn missing_returncode_is_none() {
        let resp: LoginResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.returncode, None);
        assert!(resp.modules.is_empty());
    }

    #[test]
    fn data_response_without_error_block() {
        let resp: DataResponse = serde_json::from_value(json!({
            "timestamp": 1_700_000_000,
            "data": { "cfg": { "001": { "D_3": "1" } } }
        }))
        .unwrap();

        assert_eq!(resp.timestamp.as_deref(), Some("1700000000"));
        assert!(resp.error.is_none());
        assert_eq!(resp.data["cfg"]["001"]["D_3"], json!("1"));
    }

    #[test]
    fn error_id_as_string() {
        let resp: DataResponse = serde_json::from_value(json!({
            "error": { "errorId": "9", "errorMessage": "not logged in" }
        }))
        .unwrap();

        let error = resp.error.unwrap();
        assert_eq!(error.id(), 9);
        assert_eq!(error.error_message.as_deref(), Some("not logged in"));
        assert!(resp.data.is_null());
    }
}
