// mastertherm-core: Session, polling, and point codec layer between mastertherm-api and consumers.

pub mod accessory;
pub mod codec;
pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use accessory::{
    AccessoryError, DeviceAccessories, HeatPumpThermostat, HeatingCoolingState,
    HotWaterStatus, HotWaterThermostat, SensorLocation, TemperatureDisplayUnits,
    TemperatureSensor, ThermostatStatus,
};
pub use codec::{CodecError, WriteFragment};
pub use command::{Command, CommandResult};
pub use config::{ControllerConfig, Credentials, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use session::{SessionManager, SessionState};
pub use store::SnapshotStore;
pub use stream::SnapshotStream;

pub use model::{
    DeviceIdentity, DeviceStatus, ParsePointError, PointId, PointKind, PointLayout, PointValue,
    PointWrite, Snapshot,
};
