// ── Controller abstraction ──
//
// Full lifecycle management for one MasterTherm account. Handles login,
// per-device poll timers, the pre-emptive session refresh, command routing,
// and snapshot streaming through the SnapshotStore.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mastertherm_api::MasterthermClient;

use crate::codec;
use crate::command::{Command, CommandEnvelope, CommandResult, Dispatcher};
use crate::config::ControllerConfig;
use crate::convert::transport_config;
use crate::error::CoreError;
use crate::model::{
    DeviceIdentity, DeviceStatus, PointId, PointLayout, PointValue, PointWrite, Snapshot,
};
use crate::session::{SessionManager, SessionState};
use crate::store::{Poller, SnapshotStore};
use crate::stream::SnapshotStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Every clone shares one
/// session, one message counter and one snapshot cache.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    session: Arc<SessionManager>,
    poller: Poller,
    dispatcher: Dispatcher,
    devices: watch::Sender<Arc<Vec<DeviceIdentity>>>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a new Controller from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to log in and start background tasks.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let client = MasterthermClient::new(config.url.clone(), &transport_config(&config))?;
        let session = Arc::new(SessionManager::new(client, config.credentials.clone()));
        let store = Arc::new(SnapshotStore::new());
        let poller = Poller::new(Arc::clone(&session), store);
        let dispatcher = Dispatcher::new(Arc::clone(&session), config.layout.clone());
        let (devices, _) = watch::channel(Arc::new(Vec::new()));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                session,
                poller,
                dispatcher,
                devices,
                connection_state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn layout(&self) -> &PointLayout {
        &self.inner.config.layout
    }

    /// Access the underlying SnapshotStore.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        self.inner.poller.store()
    }

    pub fn session_state(&self) -> Arc<SessionState> {
        self.inner.session.state()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the service.
    ///
    /// Logs in, records the account's modules (narrowed to
    /// `config.devices` when set), and spawns the background tasks. When
    /// background polling is enabled every device is polled once up front;
    /// a failed initial poll is logged, not fatal.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        if let Err(e) = self.inner.session.ensure_session().await {
            self.inner.connection_state.send_replace(ConnectionState::Failed);
            return Err(e);
        }

        let devices = select_devices(&self.inner.session.devices(), &self.inner.config.devices);
        if devices.is_empty() {
            warn!("no heat-pump modules to track");
        }
        self.inner.devices.send_replace(Arc::new(devices.clone()));

        let config = &self.inner.config;
        let poll_interval = config.poll_interval;

        if !poll_interval.is_zero() {
            let polls = devices.iter().map(|d| self.inner.poller.poll(&d.id));
            for (device, result) in devices.iter().zip(join_all(polls).await) {
                if let Err(e) = result {
                    warn!(device_id = %device.id, error = %e, "initial poll failed");
                }
            }
        }

        // Spawn background tasks
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx)));
        }

        if !poll_interval.is_zero() {
            for device in &devices {
                let ctrl = self.clone();
                let cancel = self.inner.cancel.clone();
                handles.push(tokio::spawn(poll_task(
                    ctrl,
                    device.id.clone(),
                    poll_interval,
                    cancel,
                )));
            }
        }

        let refresh_interval = config.session_refresh_interval;
        if !refresh_interval.is_zero() {
            let ctrl = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(session_refresh_task(
                ctrl,
                refresh_interval,
                cancel,
            )));
        }

        self.inner.connection_state.send_replace(ConnectionState::Connected);
        info!(devices = devices.len(), "connected to MasterTherm");
        Ok(())
    }

    /// Disconnect: cancel and join the background tasks.
    ///
    /// The session is memory-only and simply dropped with the controller.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Disables the timers; reads fetch on demand.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.poll_interval = Duration::ZERO;
        cfg.session_refresh_interval = Duration::ZERO;

        let controller = Controller::new(cfg)?;
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::ControllerDisconnected);
        }
        self.ensure_device(cmd.device_id())?;

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?;

        rx.await.map_err(|_| CoreError::ControllerDisconnected)?
    }

    pub async fn write_point(
        &self,
        device_id: &str,
        point: PointId,
        value: PointValue,
    ) -> Result<(), CoreError> {
        self.execute(Command::WritePoint {
            device_id: device_id.to_owned(),
            point,
            value,
        })
        .await
        .map(|_| ())
    }

    pub async fn write_points(
        &self,
        device_id: &str,
        writes: Vec<PointWrite>,
    ) -> Result<(), CoreError> {
        self.execute(Command::WritePoints {
            device_id: device_id.to_owned(),
            writes,
        })
        .await
        .map(|_| ())
    }

    /// Poll a device now and return the fresh snapshot.
    pub async fn refresh(&self, device_id: &str) -> Result<Arc<Snapshot>, CoreError> {
        match self
            .execute(Command::Refresh {
                device_id: device_id.to_owned(),
            })
            .await?
        {
            CommandResult::Snapshot(snap) => Ok(snap),
            CommandResult::Ok => Err(CoreError::Internal(
                "refresh returned no snapshot".into(),
            )),
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Latest snapshot for a device, fetched on demand if none is cached.
    pub async fn snapshot(&self, device_id: &str) -> Result<Arc<Snapshot>, CoreError> {
        self.ensure_device(device_id)?;
        self.inner.poller.snapshot(device_id).await
    }

    /// Cached snapshot only; never touches the network.
    pub fn cached_snapshot(&self, device_id: &str) -> Option<Arc<Snapshot>> {
        self.store().current(device_id)
    }

    /// Decode one point from the device's latest snapshot.
    pub async fn read_point(&self, device_id: &str, point: PointId) -> Result<PointValue, CoreError> {
        let snapshot = self.snapshot(device_id).await?;
        codec::decode(&snapshot, self.layout(), point)
            .map_err(|e| CoreError::from_codec(device_id, e))
    }

    pub fn device_status(&self, device_id: &str) -> DeviceStatus {
        self.store().status(device_id)
    }

    // ── State observation ────────────────────────────────────────

    /// Tracked devices.
    pub fn devices(&self) -> Arc<Vec<DeviceIdentity>> {
        self.inner.devices.borrow().clone()
    }

    pub fn device(&self, device_id: &str) -> Option<DeviceIdentity> {
        self.devices().iter().find(|d| d.id == device_id).cloned()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to snapshot replacements for one device.
    pub fn subscribe(&self, device_id: &str) -> Result<SnapshotStream, CoreError> {
        self.ensure_device(device_id)?;
        Ok(self.store().subscribe(device_id))
    }

    fn ensure_device(&self, device_id: &str) -> Result<(), CoreError> {
        if self.devices().iter().any(|d| d.id == device_id) {
            Ok(())
        } else {
            Err(CoreError::DeviceNotFound {
                identifier: device_id.to_owned(),
            })
        }
    }
}

/// Narrow the account's modules to the configured ids, if any.
fn select_devices(all: &[DeviceIdentity], wanted: &[String]) -> Vec<DeviceIdentity> {
    if wanted.is_empty() {
        return all.to_vec();
    }
    for id in wanted {
        if !all.iter().any(|d| &d.id == id) {
            warn!(device_id = %id, "configured module not found on account");
        }
    }
    all.iter()
        .filter(|d| wanted.contains(&d.id))
        .cloned()
        .collect()
}

// ── Background tasks ─────────────────────────────────────────────

/// Poll one device on a fixed period. Failures are logged and the cached
/// snapshot stays in place.
async fn poll_task(
    controller: Controller,
    device_id: String,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!(device_id = %device_id, "poll tick");
                if let Err(e) = controller.inner.poller.poll(&device_id).await {
                    warn!(device_id = %device_id, error = %e, "scheduled poll failed");
                }
            }
        }
    }
}

/// Re-login on a long period to pre-empt server-side expiry.
async fn session_refresh_task(controller: Controller, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match controller.inner.session.login().await {
                    Ok(_) => debug!("session refreshed"),
                    Err(e) => warn!(error = %e, "session refresh failed"),
                }
            }
        }
    }
}

/// Process commands from the mpsc channel one at a time.
async fn command_processor_task(controller: Controller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = controller.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&controller, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(controller: &Controller, cmd: Command) -> Result<CommandResult, CoreError> {
    let inner = &controller.inner;

    match cmd {
        Command::WritePoint {
            device_id,
            point,
            value,
        } => {
            inner.dispatcher.write(&device_id, point, value).await?;
            Ok(CommandResult::Ok)
        }

        Command::WritePoints { device_id, writes } => {
            inner.dispatcher.write_all(&device_id, &writes).await?;
            Ok(CommandResult::Ok)
        }

        Command::Refresh { device_id } => {
            let snapshot = inner.poller.poll(&device_id).await?;
            Ok(CommandResult::Snapshot(snapshot))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_keeps_all_devices() {
        let all = vec![DeviceIdentity::new("1", "A"), DeviceIdentity::new("2", "B")];
        assert_eq!(select_devices(&all, &[]), all);
    }

    #[test]
    fn filter_keeps_known_ids_only() {
        let all = vec![DeviceIdentity::new("1", "A"), DeviceIdentity::new("2", "B")];
        let picked = select_devices(&all, &["2".to_owned(), "9".to_owned()]);
        assert_eq!(picked, vec![DeviceIdentity::new("2", "B")]);
    }
}
