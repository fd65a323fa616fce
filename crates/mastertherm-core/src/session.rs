// ── Session lifecycle ──
//
// Owns the session cookie shared by the poll timers and the command path.
// State transitions are single atomic stores of a whole `SessionState`;
// logins are serialized so concurrent callers never race on a half-updated
// token.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use mastertherm_api::{MasterthermClient, SessionToken};

use crate::config::Credentials;
use crate::error::CoreError;
use crate::model::DeviceIdentity;

/// Observable session state.
#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated {
        token: SessionToken,
        since: DateTime<Utc>,
    },
    /// The server rejected the token; the next request logs in again.
    Expired,
    /// The last login was rejected by the service.
    Failed { message: String },
}

impl SessionState {
    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Session owner for one account.
///
/// Also hands out the message sequence numbers: one counter per manager,
/// strictly increasing for the life of the process, re-logins included.
pub struct SessionManager {
    client: MasterthermClient,
    credentials: Credentials,
    state: ArcSwap<SessionState>,
    devices: ArcSwap<Vec<DeviceIdentity>>,
    login_lock: Mutex<()>,
    message_id: AtomicU64,
}

impl SessionManager {
    pub fn new(client: MasterthermClient, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            state: ArcSwap::from_pointee(SessionState::Unauthenticated),
            devices: ArcSwap::from_pointee(Vec::new()),
            login_lock: Mutex::new(()),
            message_id: AtomicU64::new(0),
        }
    }

    pub fn client(&self) -> &MasterthermClient {
        &self.client
    }

    pub fn state(&self) -> Arc<SessionState> {
        self.state.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.load().is_authenticated()
    }

    /// Modules reported by the most recent successful login.
    pub fn devices(&self) -> Arc<Vec<DeviceIdentity>> {
        self.devices.load_full()
    }

    /// Allocate the next message sequence number.
    pub fn next_message_id(&self) -> u64 {
        self.message_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    // ── Login ───────────────────────────────────────────────────────

    /// Log in unconditionally, replacing any current session.
    ///
    /// A rejection by the service (`returncode != 0`) leaves the session
    /// `Failed` with no token. A transport failure carries no verdict and
    /// restores whatever state preceded the attempt.
    pub async fn login(&self) -> Result<SessionToken, CoreError> {
        let _guard = self.login_lock.lock().await;
        self.login_locked().await
    }

    /// Return the current token, logging in first if there is none.
    ///
    /// At most one login attempt per call.
    pub async fn ensure_session(&self) -> Result<SessionToken, CoreError> {
        if let Some(token) = self.state.load().token() {
            return Ok(token.clone());
        }

        let _guard = self.login_lock.lock().await;
        // Someone else may have logged in while we waited.
        if let Some(token) = self.state.load().token() {
            return Ok(token.clone());
        }
        self.login_locked().await
    }

    /// Mark the session expired, but only if `token` is still the current one.
    pub fn invalidate(&self, token: &SessionToken) {
        self.state.rcu(|state| {
            if state.token() == Some(token) {
                Arc::new(SessionState::Expired)
            } else {
                Arc::clone(state)
            }
        });
    }

    async fn login_locked(&self) -> Result<SessionToken, CoreError> {
        let previous = self.state.swap(Arc::new(SessionState::Authenticating));
        debug!(username = %self.credentials.username, "logging in");

        match self
            .client
            .login(&self.credentials.username, &self.credentials.password)
            .await
        {
            Ok(outcome) => {
                let devices: Vec<DeviceIdentity> =
                    outcome.modules.into_iter().map(DeviceIdentity::from).collect();
                info!(devices = devices.len(), "session established");
                self.devices.store(Arc::new(devices));
                self.state.store(Arc::new(SessionState::Authenticated {
                    token: outcome.token.clone(),
                    since: Utc::now(),
                }));
                Ok(outcome.token)
            }
            Err(mastertherm_api::Error::Authentication { message }) => {
                warn!(%message, "login rejected");
                self.state.store(Arc::new(SessionState::Failed {
                    message: message.clone(),
                }));
                Err(CoreError::AuthenticationFailed { message })
            }
            Err(e) => {
                warn!(error = %e, "login attempt failed");
                self.state.store(previous);
                Err(e.into())
            }
        }
    }

    // ── Authenticated requests ──────────────────────────────────────

    /// Run one authenticated request.
    ///
    /// The closure receives the session token and a fresh message id. When
    /// the server explicitly rejects the session, the token is invalidated,
    /// a single re-login is performed and the request is re-issued once
    /// with a new message id. Every other failure is returned as-is.
    pub async fn call<T, F, Fut>(&self, mut request: F) -> Result<T, CoreError>
    where
        F: FnMut(SessionToken, u64) -> Fut,
        Fut: Future<Output = Result<T, mastertherm_api::Error>>,
    {
        let token = self.ensure_session().await?;

        match request(token.clone(), self.next_message_id()).await {
            Err(e) if e.is_auth_expired() => {
                warn!("session rejected by server, re-authenticating");
                self.invalidate(&token);
                let token = self.ensure_session().await?;
                request(token, self.next_message_id())
                    .await
                    .map_err(CoreError::from)
            }
            other => other.map_err(CoreError::from),
        }
    }
}
