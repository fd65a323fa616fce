// ── Device identity and poll status ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A heat-pump module attached to the account.
///
/// Discovered from the login response and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
}

impl DeviceIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Poll bookkeeping for one device. Diagnostic only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub total_polls: u64,
}

impl DeviceStatus {
    pub(crate) fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_success = Some(at);
        self.consecutive_failures = 0;
        self.total_polls += 1;
    }

    pub(crate) fn record_failure(&mut self, error: String) {
        self.last_error = Some(error);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.total_polls += 1;
    }

    /// `true` once at least one poll has succeeded and the most recent one failed.
    pub fn is_stale(&self) -> bool {
        self.last_success.is_some() && self.consecutive_failures > 0
    }
}
