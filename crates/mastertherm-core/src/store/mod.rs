// ── Per-device snapshot cache ──
//
// One slot per device: the latest snapshot in a `watch` channel, poll
// bookkeeping alongside it, and an in-flight lock that keeps polls for the
// same device strictly sequential. Slots never share state, so devices
// cannot interfere with each other.

mod poller;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, watch};

use crate::model::{DeviceStatus, Snapshot};
use crate::stream::SnapshotStream;

pub use poller::Poller;

pub(crate) struct DeviceSlot {
    snapshot: watch::Sender<Option<Arc<Snapshot>>>,
    status: watch::Sender<DeviceStatus>,
    pub(crate) in_flight: Mutex<()>,
}

impl DeviceSlot {
    fn new() -> Self {
        let (snapshot, _) = watch::channel(None);
        let (status, _) = watch::channel(DeviceStatus::default());
        Self {
            snapshot,
            status,
            in_flight: Mutex::new(()),
        }
    }
}

/// Shared snapshot cache, keyed by device id.
///
/// Readers never trigger I/O here; the [`Poller`] is the only writer.
#[derive(Default)]
pub struct SnapshotStore {
    slots: DashMap<String, Arc<DeviceSlot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the slot for `device_id`.
    ///
    /// Returns an owned handle so no map shard lock is held across awaits.
    pub(crate) fn slot(&self, device_id: &str) -> Arc<DeviceSlot> {
        if let Some(slot) = self.slots.get(device_id) {
            return Arc::clone(&slot);
        }
        Arc::clone(
            &self
                .slots
                .entry(device_id.to_owned())
                .or_insert_with(|| Arc::new(DeviceSlot::new())),
        )
    }

    /// Latest snapshot of a device, if any poll has succeeded yet.
    pub fn current(&self, device_id: &str) -> Option<Arc<Snapshot>> {
        self.slots
            .get(device_id)
            .and_then(|slot| slot.snapshot.borrow().clone())
    }

    pub fn status(&self, device_id: &str) -> DeviceStatus {
        self.slots
            .get(device_id)
            .map(|slot| slot.status.borrow().clone())
            .unwrap_or_default()
    }

    /// Subscribe to snapshot replacements for one device.
    pub fn subscribe(&self, device_id: &str) -> SnapshotStream {
        SnapshotStream::new(self.slot(device_id).snapshot.subscribe())
    }

    /// Device ids with a slot, sorted.
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.slots.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    // ── Writers (poller only) ────────────────────────────────────────

    /// Replace the device's snapshot wholesale.
    pub(crate) fn publish(&self, snapshot: Arc<Snapshot>) {
        let slot = self.slot(&snapshot.device_id);
        let fetched_at = snapshot.fetched_at;
        slot.snapshot.send_replace(Some(snapshot));
        slot.status.send_modify(|s| s.record_success(fetched_at));
    }

    /// Record a failed poll. The cached snapshot is left untouched.
    pub(crate) fn record_failure(&self, device_id: &str, error: String) {
        self.slot(device_id)
            .status
            .send_modify(|s| s.record_failure(error));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn snapshot(device_id: &str, message_id: u64) -> Arc<Snapshot> {
        Arc::new(Snapshot {
            device_id: device_id.into(),
            vendor_timestamp: None,
            fetched_at: Utc::now(),
            message_id,
            data: json!({}),
        })
    }

    #[test]
    fn empty_store_has_no_snapshot() {
        let store = SnapshotStore::new();
        assert!(store.current("42").is_none());
        assert_eq!(store.status("42"), DeviceStatus::default());
    }

    #[test]
    fn failure_keeps_previous_snapshot() {
        let store = SnapshotStore::new();
        store.publish(snapshot("42", 1));
        store.record_failure("42", "busy".into());

        assert_eq!(store.current("42").unwrap().message_id, 1);
        let status = store.status("42");
        assert_eq!(status.consecutive_failures, 1);
        assert_eq!(status.last_error.as_deref(), Some("busy"));
        assert!(status.is_stale());
    }

    #[test]
    fn devices_do_not_interfere() {
        let store = SnapshotStore::new();
        store.publish(snapshot("1", 1));
        store.publish(snapshot("2", 2));
        store.record_failure("2", "timeout".into());

        assert_eq!(store.current("1").unwrap().message_id, 1);
        assert_eq!(store.status("1").consecutive_failures, 0);
        assert_eq!(store.device_ids(), vec!["1".to_owned(), "2".to_owned()]);
    }

    #[tokio::test]
    async fn subscribers_see_replacements() {
        let store = SnapshotStore::new();
        let mut stream = store.subscribe("42");
        assert!(stream.current().is_none());

        store.publish(snapshot("42", 7));
        let next = stream.changed().await.unwrap();
        assert_eq!(next.message_id, 7);
        assert_eq!(stream.current().unwrap().message_id, 7);
    }
}
