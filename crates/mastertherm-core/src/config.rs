// ── Runtime connection configuration ──
//
// These types describe *how* to talk to the MasterTherm service. They carry
// credentials and timing, but never touch disk. The CLI builds a
// `ControllerConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::model::PointLayout;

/// Default period between two polls of the same device.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Default period of the pre-emptive re-login.
pub const DEFAULT_SESSION_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Account credentials. The password is hashed just before it goes on the wire.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

/// Configuration for one account on the MasterTherm service.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Service root, e.g. `https://mastertherm.vip-it.cz`.
    pub url: Url,
    pub credentials: Credentials,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Period of the per-device poll timers. Zero disables background polling.
    pub poll_interval: Duration,
    /// Period of the pre-emptive re-login. Zero disables it.
    pub session_refresh_interval: Duration,
    /// Module ids to track. Empty means every module on the account.
    pub devices: Vec<String>,
    pub layout: PointLayout,
}

impl ControllerConfig {
    pub fn new(url: Url, credentials: Credentials) -> Self {
        Self {
            url,
            credentials,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
            session_refresh_interval: DEFAULT_SESSION_REFRESH_INTERVAL,
            devices: Vec::new(),
            layout: PointLayout::default(),
        }
    }
}
