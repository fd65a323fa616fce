// ── Snapshot poller ──
//
// Fetches full-range snapshots through the session and publishes them to
// the store. A failed fetch is logged and recorded; it never clears the
// snapshot already cached for the device.

use std::sync::Arc;

use tracing::{debug, warn};

use super::SnapshotStore;
use crate::error::CoreError;
use crate::model::Snapshot;
use crate::session::SessionManager;

/// Single writer of the [`SnapshotStore`].
#[derive(Clone)]
pub struct Poller {
    session: Arc<SessionManager>,
    store: Arc<SnapshotStore>,
}

impl Poller {
    pub fn new(session: Arc<SessionManager>, store: Arc<SnapshotStore>) -> Self {
        Self { session, store }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Fetch and publish a fresh snapshot for `device_id`.
    ///
    /// Waits for any poll of the same device already in flight.
    pub async fn poll(&self, device_id: &str) -> Result<Arc<Snapshot>, CoreError> {
        let slot = self.store.slot(device_id);
        let _in_flight = slot.in_flight.lock().await;
        self.fetch(device_id).await
    }

    /// Cached snapshot, or a synchronous fetch when nothing is cached yet.
    ///
    /// The on-demand result is cached exactly like a scheduled poll.
    pub async fn snapshot(&self, device_id: &str) -> Result<Arc<Snapshot>, CoreError> {
        if let Some(snap) = self.store.current(device_id) {
            return Ok(snap);
        }

        let slot = self.store.slot(device_id);
        let _in_flight = slot.in_flight.lock().await;
        // A poll that held the lock may have filled the slot.
        if let Some(snap) = self.store.current(device_id) {
            return Ok(snap);
        }
        debug!(device_id, "no cached snapshot, fetching on demand");
        self.fetch(device_id).await
    }

    async fn fetch(&self, device_id: &str) -> Result<Arc<Snapshot>, CoreError> {
        let client = self.session.client().clone();
        let module_id = device_id.to_owned();

        let result = self
            .session
            .call(move |token, message_id| {
                let client = client.clone();
                let module_id = module_id.clone();
                async move {
                    client
                        .fetch_snapshot(&token, message_id, &module_id)
                        .await
                        .map(|resp| (message_id, resp))
                }
            })
            .await;

        let result = result.and_then(|(message_id, resp)| {
            Snapshot::from_response(device_id, message_id, resp).map(|snap| (message_id, snap))
        });

        match result {
            Ok((message_id, snapshot)) => {
                let snapshot = Arc::new(snapshot);
                debug!(device_id, message_id, "snapshot published");
                self.store.publish(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                warn!(device_id, error = %e, "snapshot fetch failed, keeping cached data");
                self.store.record_failure(device_id, e.to_string());
                Err(e)
            }
        }
    }
}
