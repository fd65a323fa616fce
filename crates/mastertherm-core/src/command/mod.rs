// ── Command API ──
//
// All writes flow through a `Command` enum. The controller's command
// processor executes them one at a time, in arrival order.

mod dispatch;

use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{PointId, PointValue, PointWrite, Snapshot};

pub use dispatch::Dispatcher;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Every mutation the controller accepts.
#[derive(Debug, Clone)]
pub enum Command {
    /// Write a single point.
    WritePoint {
        device_id: String,
        point: PointId,
        value: PointValue,
    },
    /// Write several points strictly in order, stopping at the first failure.
    WritePoints {
        device_id: String,
        writes: Vec<PointWrite>,
    },
    /// Poll a device now, outside its timer.
    Refresh { device_id: String },
}

impl Command {
    pub fn device_id(&self) -> &str {
        match self {
            Self::WritePoint { device_id, .. }
            | Self::WritePoints { device_id, .. }
            | Self::Refresh { device_id } => device_id,
        }
    }
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    Snapshot(Arc<Snapshot>),
}
