// ── Domain model ──

pub mod device;
pub mod point;
pub mod snapshot;

pub use device::{DeviceIdentity, DeviceStatus};
pub use point::{ParsePointError, PointId, PointKind, PointLayout, PointValue, PointWrite};
pub use snapshot::Snapshot;
