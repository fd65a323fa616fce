// MasterTherm HTTP client
//
// Wraps `reqwest::Client` with the service's URL layout and the
// `{timestamp, data, error}` envelope. The client is stateless with respect
// to the session: every authenticated call takes the token explicitly.

use reqwest::header::COOKIE;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{SessionToken, preview};
use crate::error::Error;
use crate::models::DataResponse;
use crate::transport::TransportConfig;

pub(crate) const DATA_PATH: &str = "/mt/PassiveVizualizationServlet";
pub(crate) const WRITE_PATH: &str = "/mt/ActiveVizualizationServlet";

/// Vendor error id that signals the session cookie is no longer valid.
pub const SESSION_EXPIRED_ERROR_ID: i64 = 9;

/// A single point write, already encoded for the wire.
#[derive(Debug, Clone)]
pub struct WriteRequest<'a> {
    pub module_id: &'a str,
    pub config_file: &'a str,
    /// `D_3`, `I_50`, `A_191`, ...
    pub variable_id: &'a str,
    pub variable_value: &'a str,
}

/// Raw HTTP client for the MasterTherm cloud service.
///
/// Handles URL construction and envelope unwrapping. Methods return the
/// parsed [`DataResponse`] only when `errorId` is zero.
#[derive(Debug, Clone)]
pub struct MasterthermClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MasterthermClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the service root, e.g. `https://mastertherm.vip-it.cz`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the full point snapshot of one module.
    ///
    /// `POST /mt/PassiveVizualizationServlet` with
    /// `messageId=<seq>&moduleId=<id>&fullRange=true`.
    pub async fn fetch_snapshot(
        &self,
        token: &SessionToken,
        message_id: u64,
        module_id: &str,
    ) -> Result<DataResponse, Error> {
        let url = self.base_url.join(DATA_PATH)?;
        let message_id = message_id.to_string();

        debug!(module_id, message_id = %message_id, "fetching snapshot");

        self.post_form(
            url,
            token,
            &[
                ("messageId", message_id.as_str()),
                ("moduleId", module_id),
                ("fullRange", "true"),
            ],
        )
        .await
    }

    /// Write a single point.
    ///
    /// `POST /mt/ActiveVizualizationServlet`. The service has no atomic
    /// multi-point write; callers sequence several of these themselves.
    pub async fn write_point(
        &self,
        token: &SessionToken,
        message_id: u64,
        request: &WriteRequest<'_>,
    ) -> Result<DataResponse, Error> {
        let url = self.base_url.join(WRITE_PATH)?;
        let message_id = message_id.to_string();

        debug!(
            module_id = request.module_id,
            variable = request.variable_id,
            value = request.variable_value,
            message_id = %message_id,
            "writing point"
        );

        self.post_form(
            url,
            token,
            &[
                ("messageId", message_id.as_str()),
                ("moduleId", request.module_id),
                ("deviceId", "1"),
                ("configFile", request.config_file),
                ("errorResponse", "true"),
                ("variableId", request.variable_id),
                ("variableValue", request.variable_value),
            ],
        )
        .await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn post_form(
        &self,
        url: Url,
        token: &SessionToken,
        form: &[(&str, &str)],
    ) -> Result<DataResponse, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(COOKIE, token.expose())
            .form(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_envelope(resp).await
    }
}

/// Parse the `{timestamp, data, error}` envelope.
///
/// HTTP 401/403 and `errorId == 9` mean the session is gone; any other
/// non-zero `errorId` is a [`Error::Protocol`]. A missing `error` block is
/// treated as success.
async fn parse_envelope(resp: reqwest::Response) -> Result<DataResponse, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::SessionExpired);
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            body: preview(&body).to_owned(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    trace!(bytes = body.len(), "envelope received");

    let envelope: DataResponse =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

    let Some(error) = envelope.error.as_ref() else {
        return Ok(envelope);
    };

    match error.id() {
        0 => Ok(envelope),
        SESSION_EXPIRED_ERROR_ID => Err(Error::SessionExpired),
        error_id => Err(Error::Protocol {
            error_id,
            message: error
                .error_message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("errorId={error_id}")),
        }),
    }
}
