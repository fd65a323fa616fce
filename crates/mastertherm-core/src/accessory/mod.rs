// ── Consumer adapters ──
//
// Thermostat and sensor views over one heat-pump module. Reads decode the
// cached snapshot; writes go through the controller's command path. Every
// internal failure is folded into `AccessoryError::ServiceUnavailable` so
// consumers only ever see "the device is unreachable".

mod heat_pump;
mod hot_water;
mod sensor;

use std::sync::Arc;

use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::warn;

use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, Snapshot};

pub use heat_pump::{HeatPumpThermostat, ThermostatStatus};
pub use hot_water::{HotWaterStatus, HotWaterThermostat};
pub use sensor::{SensorLocation, TemperatureSensor};

/// Heating/cooling state of a thermostat, current or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HeatingCoolingState {
    Off,
    Heat,
    Cool,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum TemperatureDisplayUnits {
    Celsius,
}

/// What a consumer sees when an adapter call fails.
#[derive(Debug, Error)]
pub enum AccessoryError {
    #[error("Service communication failure: {reason}")]
    ServiceUnavailable { reason: String },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}

impl AccessoryError {
    pub(crate) fn unavailable(device_id: &str, err: &CoreError) -> Self {
        warn!(device_id, error = %err, "accessory request failed");
        Self::ServiceUnavailable {
            reason: err.to_string(),
        }
    }
}

async fn current_snapshot(
    controller: &Controller,
    device_id: &str,
) -> Result<Arc<Snapshot>, AccessoryError> {
    controller
        .snapshot(device_id)
        .await
        .map_err(|e| AccessoryError::unavailable(device_id, &e))
}

/// The full set of adapters registered for one module.
pub struct DeviceAccessories {
    pub heat_pump: HeatPumpThermostat,
    pub hot_water: HotWaterThermostat,
    pub indoor: TemperatureSensor,
    pub outdoor: TemperatureSensor,
}

impl DeviceAccessories {
    pub fn new(controller: &Controller, device: &DeviceIdentity) -> Self {
        Self {
            heat_pump: HeatPumpThermostat::new(controller.clone(), device),
            hot_water: HotWaterThermostat::new(controller.clone(), device),
            indoor: TemperatureSensor::new(controller.clone(), device, SensorLocation::Indoor),
            outdoor: TemperatureSensor::new(controller.clone(), device, SensorLocation::Outdoor),
        }
    }
}
