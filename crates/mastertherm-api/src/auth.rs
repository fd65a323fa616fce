// Authentication against the MasterTherm login plugin
//
// The service wants the SHA-1 hex digest of the password, not the
// password itself. A successful login answers with a JSON body listing the
// account's modules and hands out the session as a `Set-Cookie` header.
// The cookie is returned to the caller instead of living in a jar so the
// session owner can swap and invalidate it explicitly.

use std::fmt;
use std::sync::Arc;

use reqwest::header::SET_COOKIE;
use secrecy::{ExposeSecret, SecretString};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::client::MasterthermClient;
use crate::error::Error;
use crate::models::{LoginResponse, ModuleInfo};

pub(crate) const LOGIN_PATH: &str = "/plugins/mastertherm_login/client_login.php";

// ── SessionToken ─────────────────────────────────────────────────────

/// Opaque session cookie (`name=value`) issued by the login endpoint.
///
/// Cheap to clone. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Arc<str>);

impl SessionToken {
    pub fn new(cookie: impl Into<Arc<str>>) -> Self {
        Self(cookie.into())
    }

    /// Extract the `name=value` pair from a raw `Set-Cookie` header value.
    pub fn from_set_cookie(header: &str) -> Option<Self> {
        let pair = header.split(';').next()?.trim();
        if pair.is_empty() || !pair.contains('=') {
            return None;
        }
        Some(Self::new(pair))
    }

    /// The value to send in the `Cookie` request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: SessionToken,
    pub modules: Vec<ModuleInfo>,
}

/// SHA-1 hex digest of the password, as the login form expects it.
pub fn hash_password(password: &SecretString) -> String {
    hex::encode(Sha1::digest(password.expose_secret().as_bytes()))
}

impl MasterthermClient {
    /// Authenticate with username/password.
    ///
    /// `POST /plugins/mastertherm_login/client_login.php` with a form body of
    /// `login=login&uname=<user>&upwd=<sha1>`. A non-zero `returncode` is a
    /// vendor verdict and comes back as [`Error::Authentication`].
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, Error> {
        let url = self.base_url().join(LOGIN_PATH)?;

        debug!("logging in at {}", url);

        let hashed = hash_password(password);
        let resp = self
            .http()
            .post(url)
            .form(&[
                ("login", "login"),
                ("uname", username),
                ("upwd", hashed.as_str()),
            ])
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login rejected (HTTP {status}): {}", preview(&body)),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        // Grab the cookie before the body consumes the response.
        let token = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(SessionToken::from_set_cookie);

        let body = resp.text().await.map_err(Error::Transport)?;
        let parsed: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?;

        match parsed.returncode {
            Some(0) => {}
            code => {
                let message = parsed.message.unwrap_or_else(|| match code {
                    Some(code) => format!("returncode={code}"),
                    None => "login response carried no returncode".into(),
                });
                return Err(Error::Authentication { message });
            }
        }

        let token = token.ok_or_else(|| Error::Authentication {
            message: "login response carried no session cookie".into(),
        })?;

        debug!(modules = parsed.modules.len(), "login successful");
        Ok(LoginOutcome {
            token,
            modules: parsed.modules,
        })
    }
}

pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
