use chrono::{DateTime, Utc};
use serde::Serialize;

/// One complete poll result for one device.
///
/// Immutable; a newer poll replaces the whole value.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub device_id: String,
    /// Timestamp reported by the service, verbatim.
    pub vendor_timestamp: Option<String>,
    pub fetched_at: DateTime<Utc>,
    /// Sequence number of the request that produced this snapshot.
    pub message_id: u64,
    /// Raw `data` payload, nested `config_file -> unit -> point`.
    pub data: serde_json::Value,
}
